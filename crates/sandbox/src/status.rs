use crate::models::SandboxStatus;

/// Map a container engine status string to a sandbox status.
///
/// Total and case-insensitive. "exited" maps to Paused rather than
/// Missing: a container stopped outside this manager stays resumable.
/// Unknown values fail closed to Error.
pub fn translate_status(engine_status: &str) -> SandboxStatus {
    match engine_status.to_lowercase().as_str() {
        "running" => SandboxStatus::Running,
        "paused" | "exited" => SandboxStatus::Paused,
        "created" | "restarting" => SandboxStatus::Starting,
        "removing" => SandboxStatus::Missing,
        _ => SandboxStatus::Error,
    }
}

#[cfg(test)]
mod tests {
    use {rstest::rstest, super::*};

    #[rstest]
    #[case("running", SandboxStatus::Running)]
    #[case("paused", SandboxStatus::Paused)]
    #[case("exited", SandboxStatus::Paused)]
    #[case("created", SandboxStatus::Starting)]
    #[case("restarting", SandboxStatus::Starting)]
    #[case("removing", SandboxStatus::Missing)]
    #[case("dead", SandboxStatus::Error)]
    fn maps_known_engine_statuses(#[case] raw: &str, #[case] expected: SandboxStatus) {
        assert_eq!(translate_status(raw), expected);
    }

    #[rstest]
    #[case("RUNNING", SandboxStatus::Running)]
    #[case("Exited", SandboxStatus::Paused)]
    #[case("ReMoViNg", SandboxStatus::Missing)]
    fn is_case_insensitive(#[case] raw: &str, #[case] expected: SandboxStatus) {
        assert_eq!(translate_status(raw), expected);
    }

    #[rstest]
    #[case("")]
    #[case("unknown")]
    #[case("zombie")]
    fn unknown_statuses_fail_closed(#[case] raw: &str) {
        assert_eq!(translate_status(raw), SandboxStatus::Error);
    }
}
