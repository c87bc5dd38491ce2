use super::*;
use pretty_assertions::assert_eq;

#[test]
fn kinds_classify_into_handler_tags() {
    assert_eq!(undefined_variable("x").tag(), ErrorTag::NotFound);
    assert_eq!(index_out_of_bounds(3, 1).tag(), ErrorTag::NotFound);
    assert_eq!(private_member("_x").tag(), ErrorTag::NotFound);
    assert_eq!(file_error("a.txt", "denied").tag(), ErrorTag::FileError);
    assert_eq!(command_failed("cc", 2).tag(), ErrorTag::CommandError);
    assert_eq!(exit_requested(3).tag(), ErrorTag::Exit);
    assert_eq!(argument_error("f", "bad").tag(), ErrorTag::Internal);
    assert_eq!(thrown("boom").tag(), ErrorTag::Internal);
    assert_eq!(RuntimeError::new("misc").tag(), ErrorTag::Internal);
}

#[test]
fn only_command_and_exit_carry_levels() {
    assert_eq!(command_failed("cc", 2).level(), Some(2));
    assert_eq!(exit_requested(7).level(), Some(7));
    assert_eq!(undefined_variable("x").level(), None);
}

#[test]
fn message_matches_kind_display() {
    let err = command_failed("make", 2);
    assert_eq!(err.message, "command 'make' failed with level 2");
    assert_eq!(err.message, err.kind.to_string());
}

#[test]
fn first_location_wins() {
    let inner = SourcePos::new("a.zm", 3, 5);
    let outer = SourcePos::new("a.zm", 1, 1);
    let err = thrown("x")
        .located(&inner, &outer)
        .located(&SourcePos::new("a.zm", 9, 9), &outer);
    assert_eq!(err.pos, Some(inner));
    assert_eq!(err.within, Some(outer));
}

#[test]
fn script_error_reports_statement_and_construct() {
    let err: ScriptError = undefined_variable("dest")
        .located(&SourcePos::new("b.zm", 4, 2), &SourcePos::new("b.zm", 2, 1))
        .into();
    assert_eq!(
        err.to_string(),
        "b.zm:4:2: undefined variable: dest (in construct at b.zm:2:1)"
    );
    assert_eq!(err.tag(), ErrorTag::NotFound);
}

#[test]
fn script_error_without_construct() {
    let err: ScriptError = thrown("boom").into();
    assert_eq!(err.to_string(), "<unknown>:0:0: boom");
}
