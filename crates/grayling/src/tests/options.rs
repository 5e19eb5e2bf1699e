use crate::attr::AttrScope;
use crate::diag::Suppression;
use crate::error::Error;
use crate::options::{HostEnv, Invocation, OutputTarget, Resolved, command_basename};
use crate::{POINTS_PER_INCH, resolve_invocation};

fn argv(args: &[&str]) -> Vec<String> {
    std::iter::once("grayling-cli")
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect()
}

fn run(args: &[&str]) -> Invocation {
    match resolve_invocation(&argv(args), &HostEnv::default()).unwrap() {
        Resolved::Run(invocation) => *invocation,
        other => panic!("expected a runnable invocation, got {other:?}"),
    }
}

fn run_err(args: &[&str]) -> Error {
    resolve_invocation(&argv(args), &HostEnv::default()).unwrap_err()
}

#[test]
fn inline_and_split_flag_values_are_identical() {
    for (inline, split) in [
        (&["-Tplain"][..], &["-T", "plain"][..]),
        (&["-Klayered"][..], &["-K", "layered"][..]),
        (&["-lextra"][..], &["-l", "extra"][..]),
        (&["-oout.json"][..], &["-o", "out.json"][..]),
    ] {
        let a = run(inline);
        let b = run(split);
        assert_eq!(a.format, b.format);
        assert_eq!(a.engine, b.engine);
        assert_eq!(a.libraries, b.libraries);
        assert_eq!(a.output, b.output);
    }
}

#[test]
fn a_following_flag_is_not_consumed_as_a_value() {
    let err = run_err(&["-T", "-y"]);
    assert!(err.to_string().contains("Missing argument for -T flag"));
}

#[test]
fn quiet_levels() {
    assert_eq!(run(&[]).suppression, Suppression::None);
    assert_eq!(run(&["-q"]).suppression, Suppression::Warnings);
    assert_eq!(run(&["-q1"]).suppression, Suppression::Warnings);
    assert_eq!(run(&["-q2"]).suppression, Suppression::All);
    assert!(run(&["-q2"]).suppression > run(&["-q1"]).suppression);
    // invalid levels are reported and ignored
    assert_eq!(run(&["-q0"]).suppression, Suppression::None);
    assert_eq!(run(&["-q-1"]).suppression, Suppression::None);
}

#[test]
fn scale_defaults_and_rejections() {
    assert_eq!(run(&[]).input_scale, POINTS_PER_INCH);
    assert_eq!(run(&["-s"]).input_scale, POINTS_PER_INCH);
    assert_eq!(run(&["-s0"]).input_scale, POINTS_PER_INCH);
    assert_eq!(run(&["-s2.5"]).input_scale, 2.5);
    let err = run_err(&["-s-1"]);
    assert!(matches!(err, Error::Usage { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn scale_does_not_consume_the_next_token() {
    let invocation = run(&["-s", "2"]);
    assert_eq!(invocation.input_scale, POINTS_PER_INCH);
    assert_eq!(invocation.inputs, vec!["2".to_string()]);
}

#[test]
fn version_and_help_are_early_exits() {
    let resolved = resolve_invocation(&argv(&["-V"]), &HostEnv::default()).unwrap();
    assert!(matches!(resolved, Resolved::Version));
    let resolved = resolve_invocation(&argv(&["--version"]), &HostEnv::default()).unwrap();
    assert!(matches!(resolved, Resolved::Version));
    let resolved = resolve_invocation(&argv(&["-?"]), &HostEnv::default()).unwrap();
    assert!(matches!(resolved, Resolved::Help));
    let resolved = resolve_invocation(&argv(&["--help"]), &HostEnv::default()).unwrap();
    assert!(matches!(resolved, Resolved::Help));
    // flags before the early exit do not matter
    let resolved = resolve_invocation(&argv(&["-y", "-V", "in.gv"]), &HostEnv::default()).unwrap();
    assert!(matches!(resolved, Resolved::Version));
}

#[test]
fn unrecognized_flags_are_usage_errors() {
    let err = run_err(&["-Z"]);
    assert!(matches!(err, Error::Usage { .. }));
    assert!(err.to_string().contains("option -Z unrecognized"));
    assert!(err.prints_usage());
}

#[test]
fn attribute_declarations_are_inline_only() {
    let err = run_err(&["-G", "rankdir=LR"]);
    assert!(err.to_string().contains("Missing argument for -G flag"));
}

#[test]
fn attribute_defaults_are_fixed_once_per_scope_and_name() {
    let invocation = run(&["-Grankdir=LR", "-Grankdir=BT", "-Nshape=box"]);
    assert_eq!(
        invocation.defaults.get(AttrScope::Graph, "rankdir"),
        Some("LR")
    );
    assert_eq!(invocation.defaults.get(AttrScope::Node, "shape"), Some("box"));
    assert_eq!(invocation.defaults.get(AttrScope::Edge, "rankdir"), None);
}

#[test]
fn bare_attribute_declarations_mean_true() {
    let invocation = run(&["-Econstraint"]);
    assert_eq!(
        invocation.defaults.get(AttrScope::Edge, "constraint"),
        Some("true")
    );
}

#[test]
fn node_label_defaults_to_the_node_name_escape() {
    let invocation = run(&[]);
    assert_eq!(invocation.defaults.get(AttrScope::Node, "label"), Some("\\N"));
    let invocation = run(&["-Nlabel=custom"]);
    assert_eq!(
        invocation.defaults.get(AttrScope::Node, "label"),
        Some("custom")
    );
}

#[test]
fn positional_arguments_are_inputs_in_arrival_order() {
    let invocation = run(&["a.gv", "-y", "b.gv", "c.gv"]);
    assert_eq!(invocation.inputs, vec!["a.gv", "b.gv", "c.gv"]);
    assert!(invocation.invert_y);
}

#[test]
fn auto_naming_ignores_explicit_output_files() {
    assert_eq!(
        run(&["-oout.json"]).output,
        OutputTarget::File("out.json".to_string())
    );
    assert_eq!(run(&["-oout.json", "-O"]).output, OutputTarget::AutoName);
    assert_eq!(run(&["-O", "-oout.json"]).output, OutputTarget::AutoName);
}

#[test]
fn libraries_accumulate_in_order() {
    let invocation = run(&["-lfirst", "-l", "second"]);
    assert_eq!(invocation.libraries, vec!["first", "second"]);
}

#[test]
fn command_basename_normalizes_paths() {
    assert_eq!(command_basename("/usr/bin/layered"), "layered");
    assert_eq!(command_basename("C:\\tools\\layered.EXE"), "layered");
    assert_eq!(command_basename("layered/"), "layered");
    assert_eq!(command_basename(""), "");
}

#[test]
fn sandbox_toggle_aborts_before_parsing() {
    let env = HostEnv {
        legacy_file_path: Some("/tmp".to_string()),
        ..HostEnv::default()
    };
    let err = resolve_invocation(&argv(&["-V"]), &env).unwrap_err();
    assert!(matches!(err, Error::SandboxEnv));
    assert!(!err.prints_usage());
    assert!(err.to_string().contains("no longer supported"));
}

#[test]
fn server_context_is_captured_from_the_environment_probe() {
    let env = HostEnv {
        server_name: Some("example.org".to_string()),
        ..HostEnv::default()
    };
    match resolve_invocation(&argv(&[]), &env).unwrap() {
        Resolved::Run(invocation) => assert!(invocation.server_context),
        other => panic!("expected a runnable invocation, got {other:?}"),
    }
    assert!(!run(&[]).server_context);
}
