// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn job_kind_round_trips_through_display() {
    for kind in JobKind::ALL {
        assert_eq!(kind.to_string().parse::<JobKind>().unwrap(), kind);
    }
}

#[test]
fn job_kind_serializes_kebab_case() {
    let json = serde_json::to_string(&JobKind::StemSeparation).unwrap();
    assert_eq!(json, "\"stem-separation\"");
}

#[test]
fn unknown_kind_is_validation_error() {
    let err = "karaoke".parse::<JobKind>().unwrap_err();
    assert_eq!(err, ValidationError::UnknownKind("karaoke".to_string()));
}

#[yare::parameterized(
    created   = { JobStatus::Created,   false },
    queued    = { JobStatus::Queued,    false },
    running   = { JobStatus::Running,   false },
    completed = { JobStatus::Completed, true },
    failed    = { JobStatus::Failed,    true },
    cancelled = { JobStatus::Cancelled, true },
    timeout   = { JobStatus::Timeout,   true },
)]
fn status_terminality(status: JobStatus, terminal: bool) {
    assert_eq!(status.is_terminal(), terminal);
}

#[test]
fn new_job_starts_created_with_no_attempts() {
    let spec = JobSpec::new(JobKind::Scan).priority(PRIORITY_USER).user_initiated(true);
    let job = Job::new(JobId::from_string("job-a"), spec, 7, 1_000);

    assert_eq!(job.status, JobStatus::Created);
    assert_eq!(job.attempts, 0);
    assert_eq!(job.seq, 7);
    assert_eq!(job.created_at_ms, 1_000);
    assert!(job.user_initiated);
    assert!(job.queued_at_ms.is_none());
    assert!(job.started_at_ms.is_none());
    assert!(!job.is_batch());
}

#[test]
fn spec_defaults_validate() {
    assert_eq!(JobSpec::new(JobKind::Export).validate(), Ok(()));
}

#[yare::parameterized(
    priority_zero   = { JobSpec::new(JobKind::Scan).priority(0), ValidationError::PriorityOutOfRange(0) },
    priority_eleven = { JobSpec::new(JobKind::Scan).priority(11), ValidationError::PriorityOutOfRange(11) },
    zero_timeout    = { JobSpec::new(JobKind::Scan).timeout_secs(0), ValidationError::InvalidTimeout },
    zero_attempts   = { JobSpec::new(JobKind::Scan).max_attempts(0), ValidationError::InvalidMaxAttempts(0) },
    empty_batch     = { JobSpec::new(JobKind::BatchAnalyze).batch_size(0u32), ValidationError::EmptyBatch },
    nested_batch    = {
        JobSpec::new(JobKind::BatchAnalyze).batch_size(2u32).parent_job_id("job-p"),
        ValidationError::NestedBatch
    },
)]
fn spec_rejections(spec: JobSpec, expected: ValidationError) {
    assert_eq!(spec.validate(), Err(expected));
}

#[test]
fn payload_must_be_object_or_null() {
    let ok = JobSpec::new(JobKind::Analyze).payload(json!({"path": "/music/a.flac"}));
    assert!(ok.validate().is_ok());

    let bad = JobSpec::new(JobKind::Analyze).payload(json!(["/music/a.flac"]));
    assert!(matches!(bad.validate(), Err(ValidationError::MalformedPayload(msg)) if msg.contains("array")));
}

#[test]
fn overdue_requires_running_and_past_deadline() {
    let job = Job::builder()
        .status(JobStatus::Running)
        .started_at_ms(1_000u64)
        .timeout_at_ms(31_000u64)
        .build();
    assert!(!job.is_overdue(31_000));
    assert!(job.is_overdue(31_001));

    let queued = Job::builder().status(JobStatus::Queued).timeout_at_ms(0u64).build();
    assert!(!queued.is_overdue(u64::MAX));
}

#[test]
fn batch_parents_are_never_overdue() {
    let parent = Job::builder()
        .status(JobStatus::Running)
        .batch_size(3u32)
        .timeout_at_ms(0u64)
        .build();
    assert!(!parent.is_overdue(10));
}

#[test]
fn job_serde_omits_unset_optionals() {
    let job = Job::builder().build();
    let value = serde_json::to_value(&job).unwrap();
    assert!(value.get("parent_job_id").is_none());
    assert!(value.get("error").is_none());
    assert_eq!(value["status"], "created");

    let back: Job = serde_json::from_value(value).unwrap();
    assert_eq!(back, job);
}
