//! Invocation-argument resolution.
//!
//! Scans `argv` into an immutable [`Invocation`]. Flag conventions:
//!
//! - `-T`, `-K`, `-l`, `-o` take a value either inline (`-Tjson`) or as the
//!   next token (`-T json`) when that token does not start with `-`.
//! - `-G`, `-N`, `-E` take their `name=val` declaration inline only.
//! - `-q` and `-s` take an optional numeric suffix and fall back to a fixed
//!   constant when none is present.
//!
//! Anything not starting with `-` is an input filename, kept in arrival
//! order. An empty input list means standard input.

use crate::POINTS_PER_INCH;
use crate::attr::{AttrScope, GlobalDefaults, double_prefix, int_prefix};
use crate::diag::Suppression;
use crate::error::{Error, Result};

/// Escape in a node label default that expands to the node's own name.
pub const NODE_NAME_ESC: &str = "\\N";

/// Host environment, probed once before any argument is inspected.
///
/// Tests construct this directly rather than mutating the process
/// environment.
#[derive(Debug, Clone, Default)]
pub struct HostEnv {
    /// `SERVER_NAME`: set when running under a web/CGI server. Gates the
    /// `imagepath` attribute lookup.
    pub server_name: Option<String>,
    /// `GRAYLING_FILE_PATH`: deprecated sandbox toggle; must be absent.
    pub legacy_file_path: Option<String>,
    /// `GRAYLING_FONTPATH`: font directory override.
    pub font_path: Option<String>,
}

impl HostEnv {
    pub fn capture() -> Self {
        Self {
            server_name: std::env::var("SERVER_NAME").ok(),
            legacy_file_path: std::env::var("GRAYLING_FILE_PATH").ok(),
            font_path: std::env::var("GRAYLING_FONTPATH").ok(),
        }
    }

    pub fn server_context(&self) -> bool {
        self.server_name.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputTarget {
    #[default]
    Stdout,
    File(String),
    /// `-O`: derive an output name from each input filename; any `-o` is
    /// ignored while this is active.
    AutoName,
}

/// The resolved configuration of one invocation. Immutable once returned.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub cmd_name: String,
    pub verbose: bool,
    /// Requested output format (`-T`); `None` selects the default device.
    pub format: Option<String>,
    /// Requested layout engine (`-K`); `None` derives one from `cmd_name`.
    pub engine: Option<String>,
    pub libraries: Vec<String>,
    pub output: OutputTarget,
    pub suppression: Suppression,
    /// Input scale in points per drawing unit (`-s`).
    pub input_scale: f64,
    pub reduce: bool,
    pub invert_y: bool,
    /// `-P`: inject the plugin-inventory pseudo-graph into the stream.
    pub plugin_inventory: bool,
    pub defaults: GlobalDefaults,
    pub inputs: Vec<String>,
    pub server_context: bool,
}

/// Outcome of argument resolution. `Version` and `Help` are successful early
/// exits; the caller prints the corresponding text to stdout.
#[derive(Debug)]
pub enum Resolved {
    Run(Box<Invocation>),
    Version,
    Help,
}

pub fn usage_text(cmd_name: &str) -> String {
    format!(
        "Usage: {cmd_name} [-Vv?] [-(GNE)name=val] [-(KTlo)<val>] [-O] [-P] [-q[l]] [-s[v]] [-xy] <graph files>\n\
\n\
 -V          - Print version and exit\n\
 -v          - Enable verbose mode\n\
 -Gname=val  - Set graph attribute 'name' to 'val'\n\
 -Nname=val  - Set node attribute 'name' to 'val'\n\
 -Ename=val  - Set edge attribute 'name' to 'val'\n\
 -Tv         - Set output format to 'v'\n\
 -Kv         - Set layout engine to 'v' (overrides default based on command name)\n\
 -lv         - Use external library 'v'\n\
 -ofile      - Write output to 'file'\n\
 -O          - Automatically generate an output filename based on the input filename with a .'format' appended. (Causes all -ofile options to be ignored.)\n\
 -P          - Internally generate a graph of the current plugins.\n\
 -q[l]       - Set level of message suppression (=1)\n\
 -s[v]       - Scale input by 'v' (=72)\n\
 -x          - Reduce graph\n\
 -y          - Invert y coordinate in output\n\
 -?          - Print usage and exit\n"
    )
}

pub fn version_banner(cmd_name: &str) -> String {
    format!("{cmd_name} - grayling version {}", crate::VERSION)
}

/// Partial basename: strips trailing (back)slashes, keeps the text after the
/// last separator, and drops a trailing `.exe` case-insensitively so engine
/// matching works with Windows executable names.
pub fn command_basename(path: &str) -> String {
    let trimmed = path.trim_end_matches(['/', '\\']);
    let base = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed);
    let base = match base.char_indices().rev().nth(3) {
        Some((i, _)) if base[i..].eq_ignore_ascii_case(".exe") => &base[..i],
        _ => base,
    };
    base.to_string()
}

/// Value for a `-X` flag: inline characters after the flag letter win;
/// otherwise the next token is consumed unless it starts with `-`.
fn flag_value<'a>(argv: &'a [String], i: &mut usize) -> Option<&'a str> {
    let arg = argv[*i].as_str();
    if arg.len() > 2 {
        return Some(&arg[2..]);
    }
    if let Some(next) = argv.get(*i + 1) {
        if !next.is_empty() && !next.starts_with('-') {
            *i += 1;
            return Some(next);
        }
    }
    None
}

fn missing_argument(flag: char) -> Error {
    Error::usage(format!("Missing argument for -{flag} flag"))
}

/// Scans `argv` (including the command path at index 0) into a [`Resolved`].
///
/// The legacy sandbox toggle is checked before anything else; when present
/// the invocation fails fatally without usage text.
pub fn resolve_invocation(argv: &[String], env: &HostEnv) -> Result<Resolved> {
    if env.legacy_file_path.is_some() {
        return Err(Error::SandboxEnv);
    }

    let cmd_name = command_basename(argv.first().map(String::as_str).unwrap_or(""));

    let mut verbose = false;
    let mut format: Option<String> = None;
    let mut engine: Option<String> = None;
    let mut libraries: Vec<String> = Vec::new();
    let mut output_file: Option<String> = None;
    let mut auto_name = false;
    let mut suppression = Suppression::None;
    let mut input_scale = POINTS_PER_INCH;
    let mut reduce = false;
    let mut invert_y = false;
    let mut plugin_inventory = false;
    let mut defaults = GlobalDefaults::new();
    let mut inputs: Vec<String> = Vec::new();

    let mut i = 1;
    while i < argv.len() {
        let arg = argv[i].as_str();
        if arg == "--version" || arg.starts_with("-V") {
            return Ok(Resolved::Version);
        }
        if arg == "--help" || arg.starts_with("-?") {
            return Ok(Resolved::Help);
        }
        if let Some(rest) = arg.strip_prefix('-') {
            let mut chars = rest.chars();
            let flag = chars.next().unwrap_or('\0');
            let rest = chars.as_str();
            match flag {
                'G' | 'N' | 'E' => {
                    if rest.is_empty() {
                        return Err(missing_argument(flag));
                    }
                    let scope = match flag {
                        'G' => AttrScope::Graph,
                        'N' => AttrScope::Node,
                        _ => AttrScope::Edge,
                    };
                    defaults.declare(scope, rest);
                }
                'T' => {
                    let Some(val) = flag_value(argv, &mut i) else {
                        return Err(missing_argument('T'));
                    };
                    format = Some(val.to_string());
                }
                'K' => {
                    let Some(val) = flag_value(argv, &mut i) else {
                        return Err(missing_argument('K'));
                    };
                    engine = Some(val.to_string());
                }
                'l' => {
                    let Some(val) = flag_value(argv, &mut i) else {
                        return Err(missing_argument('l'));
                    };
                    libraries.push(val.to_string());
                }
                'o' => {
                    let Some(val) = flag_value(argv, &mut i) else {
                        return Err(missing_argument('o'));
                    };
                    output_file = Some(val.to_string());
                }
                'O' => auto_name = true,
                'P' => plugin_inventory = true,
                'q' => {
                    if rest.is_empty() {
                        suppression = Suppression::Warnings;
                    } else {
                        match int_prefix(rest).and_then(Suppression::from_level) {
                            Some(level) => suppression = level,
                            None => eprintln!(
                                "Invalid parameter \"{rest}\" for -q flag - ignored"
                            ),
                        }
                    }
                }
                's' => {
                    if rest.is_empty() {
                        input_scale = POINTS_PER_INCH;
                    } else {
                        let scale = double_prefix(rest).unwrap_or(0.0);
                        if scale < 0.0 {
                            return Err(Error::usage(format!(
                                "Invalid parameter \"{rest}\" for -s flag"
                            )));
                        }
                        input_scale = if scale == 0.0 { POINTS_PER_INCH } else { scale };
                    }
                }
                'v' => verbose = true,
                'x' => reduce = true,
                'y' => invert_y = true,
                _ => {
                    return Err(Error::usage(format!(
                        "{cmd_name}: option {arg} unrecognized"
                    )));
                }
            }
        } else {
            inputs.push(arg.to_string());
        }
        i += 1;
    }

    // The node label defaults to the node's own name unless the user set one.
    if defaults.get(AttrScope::Node, "label").is_none() {
        defaults.declare(AttrScope::Node, &format!("label={NODE_NAME_ESC}"));
    }

    let output = if auto_name {
        OutputTarget::AutoName
    } else if let Some(file) = output_file {
        OutputTarget::File(file)
    } else {
        OutputTarget::Stdout
    };

    Ok(Resolved::Run(Box::new(Invocation {
        cmd_name,
        verbose,
        format,
        engine,
        libraries,
        output,
        suppression,
        input_scale,
        reduce,
        invert_y,
        plugin_inventory,
        defaults,
        inputs,
        server_context: env.server_context(),
    })))
}
