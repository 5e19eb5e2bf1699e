use grayling::{
    Diagnostics, EngineAliases, GraphDoc, GraphHandle, HostEnv, InitContext, InputGraphStream,
    Invocation, LayoutConfig, OutputTarget, PluginRegistry, PluginSelection, Resolved,
    command_basename, init_graph_config, inventory_graph, resolve_invocation, select_plugins,
    usage_text, version_banner,
};
use serde::Serialize;
use std::io::Write;

/// One graph's worth of output: the resolved configuration plus everything
/// the downstream renderer needs alongside it.
#[derive(Serialize)]
struct GraphOut<'a> {
    source: &'a str,
    index: usize,
    engine: &'a str,
    scale: f64,
    invert_y: bool,
    libraries: &'a [String],
    graph: &'a GraphDoc,
    config: &'a LayoutConfig,
}

enum OutputSink {
    Stdout,
    File(std::fs::File),
    /// `-O`: one file per graph, named after the graph's source.
    AutoName,
}

impl OutputSink {
    fn open(target: &OutputTarget) -> std::io::Result<Self> {
        Ok(match target {
            OutputTarget::Stdout => Self::Stdout,
            OutputTarget::File(path) => Self::File(std::fs::File::create(path)?),
            OutputTarget::AutoName => Self::AutoName,
        })
    }
}

/// Output filename for auto-name mode: the source name with `.<device>`
/// appended, plus the graph's index for second and later graphs from the
/// same source. Pseudo-sources (stdin, the plugin inventory) use `noname`.
fn auto_name(source: &str, index: usize, device: &str) -> String {
    let base = if source.starts_with('<') {
        "noname"
    } else {
        source
    };
    if index == 0 {
        format!("{base}.{device}")
    } else {
        format!("{base}.{index}.{device}")
    }
}

fn write_json(w: &mut dyn Write, out: &GraphOut<'_>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *w, out)?;
    writeln!(w)
}

fn write_plain(w: &mut dyn Write, out: &GraphOut<'_>) -> std::io::Result<()> {
    let name = if out.graph.name.is_empty() {
        "<anonymous>"
    } else {
        out.graph.name.as_str()
    };
    writeln!(w, "graph {name} source={} index={}", out.source, out.index)?;
    writeln!(w, "engine {}", out.engine)?;
    writeln!(w, "charset {}", out.config.charset.canonical_name())?;
    writeln!(
        w,
        "rankdir effective={:?} requested={:?}",
        out.config.rankdir.effective(),
        out.config.rankdir.requested()
    )?;
    writeln!(
        w,
        "nodesep {} ranksep {} exact={}",
        out.config.node_sep, out.config.rank_sep, out.config.exact_ranksep
    )?;
    if let Some(size) = &out.config.size {
        writeln!(
            w,
            "size {} {} hard_limit={}",
            size.width, size.height, size.hard_limit
        )?;
    }
    if let Some(label) = &out.config.label {
        writeln!(w, "label {:?}", label.text)?;
    }
    writeln!(w, "end")
}

fn emit_graph(
    sink: &mut OutputSink,
    selection: &PluginSelection,
    handle: &GraphHandle,
    out: &GraphOut<'_>,
) -> std::io::Result<()> {
    let write: fn(&mut dyn Write, &GraphOut<'_>) -> std::io::Result<()> =
        match selection.device.name.as_str() {
            "plain" => write_plain,
            _ => write_json,
        };
    match sink {
        OutputSink::Stdout => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock, out)?;
            lock.flush()
        }
        OutputSink::File(file) => {
            write(file, out)?;
            file.flush()
        }
        OutputSink::AutoName => {
            let path = auto_name(&handle.source, handle.index, &selection.device.name);
            let mut file = std::fs::File::create(path)?;
            write(&mut file, out)?;
            file.flush()
        }
    }
}

fn run(invocation: Invocation, host: &HostEnv) -> i32 {
    if invocation.verbose {
        eprintln!("{}", version_banner(&invocation.cmd_name));
    }

    let registry = PluginRegistry::builtin();
    let aliases = EngineAliases::default();
    // plugin resolution must succeed before any input is read
    let selection = match select_plugins(&registry, &invocation, &aliases) {
        Ok(selection) => selection,
        Err(err) => {
            eprintln!("{err}");
            return err.exit_code();
        }
    };

    let mut diag = Diagnostics::new(invocation.suppression);
    let mut sink = match OutputSink::open(&invocation.output) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("{}: {err}", invocation.cmd_name);
            return 1;
        }
    };

    let inventory = invocation
        .plugin_inventory
        .then(|| inventory_graph(&registry));
    let mut stream = InputGraphStream::new(
        invocation.cmd_name.clone(),
        invocation.inputs.clone(),
        inventory,
    );

    while let Some(mut handle) = stream.next_graph(&mut diag) {
        handle.doc.apply_graph_defaults(&invocation.defaults);
        let ctx = InitContext {
            use_rankdir: selection.engine.name == aliases.canonical,
            reduce: invocation.reduce,
            server_context: invocation.server_context,
            font_path_override: host.font_path.as_deref(),
        };
        let config = init_graph_config(&handle.doc, &ctx, &diag);
        let out = GraphOut {
            source: &handle.source,
            index: handle.index,
            engine: &selection.engine.name,
            scale: invocation.input_scale,
            invert_y: invocation.invert_y,
            libraries: &invocation.libraries,
            graph: &handle.doc,
            config: &config,
        };
        if let Err(err) = emit_graph(&mut sink, &selection, &handle, &out) {
            diag.error(format_args!(
                "{}: can't write output: {err}",
                invocation.cmd_name
            ));
        }
    }

    if diag.error_count() > 0 { 1 } else { 0 }
}

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    let host = HostEnv::capture();
    let cmd_name = command_basename(argv.first().map(String::as_str).unwrap_or(""));

    let invocation = match resolve_invocation(&argv, &host) {
        Ok(Resolved::Version) => {
            println!("{}", version_banner(&cmd_name));
            return;
        }
        Ok(Resolved::Help) => {
            print!("{}", usage_text(&cmd_name));
            return;
        }
        Ok(Resolved::Run(invocation)) => *invocation,
        Err(err) => {
            eprintln!("{err}");
            if err.prints_usage() {
                eprint!("{}", usage_text(&cmd_name));
            }
            std::process::exit(err.exit_code());
        }
    };

    std::process::exit(run(invocation, &host));
}
