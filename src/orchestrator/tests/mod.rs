use super::test_helpers::{
    FakeCatalog, FakeFetcher, create_test_downloader, drain_events, episodes,
};
use super::{BatchDownloader, SeasonRequest};
use crate::error::ConfigError;
use crate::types::{Event, TaskOutcome, TaskState};
use std::sync::Arc;
use std::time::Duration;
