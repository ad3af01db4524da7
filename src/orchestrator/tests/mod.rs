use super::test_helpers::*;
use super::*;
use crate::error::Error;
use crate::types::{FileEntry, Job, JobId, Phase};
use std::sync::Arc;
