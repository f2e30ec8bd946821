use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        AssemblyError::capability("x")
            .to_string()
            .contains("capability error:")
    );
    assert!(AssemblyError::asset("x").to_string().contains("asset error:"));
    assert!(
        AssemblyError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        AssemblyError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        AssemblyError::fallback_exhausted("a", "b")
            .to_string()
            .starts_with("fallback exhausted:")
    );
}

#[test]
fn only_render_errors_are_recoverable() {
    assert!(AssemblyError::render("exit 1").is_recoverable());
    assert!(!AssemblyError::asset("none").is_recoverable());
    assert!(!AssemblyError::capability("missing").is_recoverable());
    assert!(!AssemblyError::Cancelled.is_recoverable());
    assert!(!AssemblyError::fallback_exhausted("a", "b").is_recoverable());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = AssemblyError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
