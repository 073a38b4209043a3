use ahash::AHashMap;
use clap::Parser;
use itertools::Itertools;
use saisei::ast::DisplayExpression;
use saisei::compiler::parse_rule;
use saisei::error::WorkflowConversionError;
use saisei::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, BufRead, Write};
use std::time::Instant;

// --- JSON Deserialization Structs (Editor Format Specific) ---
// These structs match the node editor's `workflow.json` export and are only used here for conversion.

#[derive(Deserialize)]
struct RawWorkflow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    config: Map<String, Value>,
    /// Editor payload: a label plus type-specific settings, sometimes nested under `config`.
    #[serde(default)]
    data: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawEdge {
    #[serde(default)]
    id: Option<String>,
    source: String,
    target: String,
    #[serde(default, alias = "sourceHandle")]
    source_handle: Option<String>,
}

// --- Converter Implementation ---
// This implements the conversion from the editor model to Saisei's canonical WorkflowDefinition.

impl IntoWorkflow for RawWorkflow {
    fn into_workflow(self) -> Result<WorkflowDefinition, WorkflowConversionError> {
        let mut kinds = AHashMap::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for raw in self.nodes {
            if raw.id.trim().is_empty() {
                return Err(WorkflowConversionError::ValidationError(
                    "node ids must not be empty".to_string(),
                ));
            }
            let kind: NodeKind =
                raw.node_type
                    .parse()
                    .map_err(|_| WorkflowConversionError::UnknownNodeType {
                        node_id: raw.id.clone(),
                        type_name: raw.node_type.clone(),
                    })?;

            let mut data = raw.data;
            let label = raw
                .label
                .or_else(|| data.get("label").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| raw.id.clone());
            data.remove("label");
            let nested = match data.remove("config") {
                Some(Value::Object(nested)) => nested,
                _ => Map::new(),
            };

            let mut node = WorkflowNode::new(raw.id.clone(), kind, label);
            node.config.extend(data);
            node.config.extend(nested);
            node.config.extend(raw.config);
            kinds.insert(raw.id, kind);
            nodes.push(node);
        }

        let edges = self
            .edges
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let id = raw.id.unwrap_or_else(|| format!("edge-{}", i + 1));
                let source_is_decision = kinds.get(&raw.source).is_some_and(|k| k.is_decision_like());
                let handle = match raw.source_handle.as_deref() {
                    None | Some("") => None,
                    Some(tag) => match BranchHandle::from_tag(tag) {
                        Some(handle) => Some(handle),
                        // Non-decision nodes carry editor port names such as "output-0".
                        None if !source_is_decision => None,
                        None => {
                            return Err(WorkflowConversionError::InvalidHandle {
                                edge_id: id,
                                handle: tag.to_string(),
                            });
                        }
                    },
                };
                let edge = WorkflowEdge::new(id, raw.source, raw.target);
                Ok(match handle {
                    Some(handle) => edge.with_handle(handle),
                    None => edge,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(WorkflowDefinition { nodes, edges })
    }
}

/// Step through node-based workflows and inspect how data flows through them
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow JSON file
    workflow_path: Option<String>,
    /// Optional path to the initial data JSON file
    data_path: Option<String>,

    /// Optional path to a simulator configuration JSON file
    #[arg(short, long)]
    config: Option<String>,

    /// Step through the run manually instead of autoplaying it
    #[arg(short = 'i', long)]
    interactive: bool,

    /// Autoplay interval in milliseconds (overrides the configuration)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Save the finished run to this history file
    #[arg(long)]
    history: Option<String>,

    /// Print the runs stored in the history file and exit
    #[arg(long, requires = "history")]
    list_history: bool,

    /// Validate the workflow and its rules without running it
    #[arg(long)]
    check: bool,
}

struct LoadedWorkflow {
    id: String,
    name: String,
    definition: WorkflowDefinition,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimulatorConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load configuration: {}", e))),
        None => SimulatorConfig::default(),
    };

    if cli.list_history {
        list_history(cli.history.as_deref().unwrap_or_default(), &config);
        return;
    }

    let workflow_path = cli
        .workflow_path
        .clone()
        .or_else(|| prompt_for_input("Enter workflow path", Some("data/workflow.json")))
        .unwrap_or_else(|| exit_with_error("No workflow path given"));
    let workflow = load_workflow(&workflow_path);

    if cli.check {
        check_workflow(&workflow.definition);
        return;
    }

    let initial_data = match &cli.data_path {
        Some(path) => InitialData::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load initial data: {}", e))
        }),
        None => {
            println!("No initial data file provided. Using default mock data.");
            InitialData::sample()
        }
    };

    let simulator = WorkflowSimulator::builder(workflow.definition, initial_data.into_inner())
        .with_workflow_id(workflow.id)
        .with_workflow_name(workflow.name)
        .build();

    let run_start = Instant::now();
    let record = if cli.interactive {
        run_interactive(simulator).await
    } else {
        let interval = cli
            .interval_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or_else(|| config.autoplay_interval());
        run_autoplay(simulator, interval).await
    };
    let run_duration = run_start.elapsed();

    println!("\n--- Run Summary ---");
    println!("Outcome:     {:?}", record.status);
    println!("Steps:       {}", record.steps.len());
    println!(
        "Path:        {}",
        record.steps.iter().map(|s| s.node_id.as_str()).join(" -> ")
    );
    println!("Node time:   {} ms", record.duration_ms);
    println!("Wall time:   {:?}", run_duration);

    if let Some(path) = &cli.history {
        let mut store = JsonFileHistoryStore::with_capacity(path, config.history_max_records)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to open history: {}", e)));
        let id = record.id.clone();
        store
            .save(record)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save run: {}", e)));
        println!("Saved run '{}' to '{}'", id, path);
    }
}

fn load_workflow(path: &str) -> LoadedWorkflow {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read workflow file '{}': {}", path, e))
    });
    let raw: RawWorkflow = serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse workflow JSON: {}", e)));

    let id = raw.id.clone().unwrap_or_else(|| path.to_string());
    let name = raw.name.clone().unwrap_or_else(|| id.clone());
    let definition = raw
        .into_workflow()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert workflow: {}", e)));

    LoadedWorkflow {
        id,
        name,
        definition,
    }
}

async fn run_autoplay(simulator: WorkflowSimulator, interval: std::time::Duration) -> SimulationRecord {
    let shared = SharedSimulator::new(simulator);
    let mut snapshots = shared.subscribe();

    let first = shared.start().await;
    print_step(&first);
    snapshots.borrow_and_update();

    if first.is_running {
        let autoplay = Autoplay::spawn(shared.clone(), interval);
        while snapshots.changed().await.is_ok() {
            let state = snapshots.borrow_and_update().clone();
            print_step(&state);
            if !state.is_running {
                break;
            }
        }
        autoplay.stop();
    }

    shared.with(|simulator| SimulationRecord::capture(simulator)).await
}

async fn run_interactive(mut simulator: WorkflowSimulator) -> SimulationRecord {
    println!("--- Saisei Interactive Mode ---");
    println!("Commands: [n]ext, [b]ack, [p]ause, [r]esume, [s]tart over, [q]uit");

    print_step(&simulator.start().await);
    loop {
        let Some(command) = prompt_for_input("Command", Some("n")) else {
            println!();
            break;
        };
        let state = match command.as_str() {
            "n" | "next" => simulator.step_forward().await,
            "b" | "back" => simulator.step_backward(),
            "p" | "pause" => simulator.pause(),
            "r" | "resume" => simulator.resume(),
            "s" | "start" => simulator.start().await,
            "q" | "quit" => break,
            other => {
                println!("Unknown command '{}'", other);
                continue;
            }
        };
        print_step(&state);
        println!("  phase: {:?}", simulator.phase());
    }

    SimulationRecord::capture(&simulator)
}

fn print_step(state: &SimulationState) {
    let Some(step) = state.current_step() else {
        println!("(not started)");
        return;
    };
    let kind = step
        .node_type
        .map(|k| k.to_string())
        .unwrap_or_else(|| "graph".to_string());

    println!(
        "[{}/{}] {} ({}) {:?} in {} ms",
        state.current_step_index + 1,
        state.steps.len(),
        step.node_name,
        kind,
        step.status,
        step.execution_time_ms
    );
    if let Some(reason) = &step.reason {
        println!("  -> Reason: {}", reason);
    }
    if let Some(output) = &step.output {
        println!("  -> Output: {}", output);
    }
    if let Some(error) = &step.error {
        println!("  -> Error: {}", error);
    }
}

fn check_workflow(definition: &WorkflowDefinition) {
    let rules = RuleEngine::new();
    let mut problems = 0;

    match WorkflowGraph::build(definition.clone()).and_then(|g| g.entry().map(|e| (g, e))) {
        Ok((graph, entry)) => println!(
            "Graph OK: {} nodes, {} edges, entry '{}'",
            graph.len(),
            graph.edges().len(),
            graph.node(entry).id
        ),
        Err(e) => {
            problems += 1;
            println!("Graph error: {}", e);
        }
    }

    for node in definition.nodes.iter().filter(|n| n.kind.is_decision_like()) {
        let Some(rule) = node.condition() else {
            if node.kind != NodeKind::LlmJudgment {
                problems += 1;
                println!("\n'{}' has no condition", node.id);
            }
            continue;
        };
        let report = rules.validate(rule);
        println!("\n'{}': {}", node.id, rule);
        if report.is_valid {
            println!("  reads: {}", report.variables.iter().join(", "));
            if let Ok(expr) = parse_rule(rule) {
                print!("{}", DisplayExpression { expr: &expr });
            }
        } else {
            problems += 1;
            for error in &report.errors {
                println!("  error: {}", error);
            }
            for suggestion in &report.suggestions {
                println!("  hint:  {}", suggestion);
            }
        }
    }

    if problems > 0 {
        exit_with_error(&format!("{} problem(s) found", problems));
    }
    println!("\nNo problems found.");
}

fn list_history(path: &str, config: &SimulatorConfig) {
    let store = JsonFileHistoryStore::with_capacity(path, config.history_max_records)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to open history: {}", e)));
    let stats = store
        .statistics()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read history: {}", e)));
    println!(
        "{} runs ({} success, {} error, {} partial)",
        stats.total, stats.success, stats.error, stats.partial
    );

    let records = store
        .list(config.history_list_limit)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read history: {}", e)));
    for record in records {
        println!(
            "  {}  {:<24} {:?}  {} steps  {} ms",
            record.id,
            record.workflow_name,
            record.status,
            record.steps.len(),
            record.duration_ms
        );
    }
}

/// A helper function to prompt the user and read a line of input.
/// Prompts on stdout and reads the answer from stdin. Returns `None` once stdin is closed.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> Option<String> {
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    if io::stdout().flush().is_err() {
        exit_with_error("Failed to write to the terminal");
    }
    read_answer(&mut io::stdin().lock(), default)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read from the terminal: {}", e)))
}

fn read_answer(input: &mut impl BufRead, default: Option<&str>) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();

    if trimmed.is_empty() {
        Ok(Some(default.unwrap_or("").to_string()))
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_takes_the_default() {
        let mut input = io::Cursor::new("\n  b  \n");
        assert_eq!(read_answer(&mut input, Some("n")).unwrap().as_deref(), Some("n"));
        assert_eq!(read_answer(&mut input, Some("n")).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn closed_input_ends_the_prompt() {
        let mut input = io::Cursor::new("q");
        assert_eq!(read_answer(&mut input, Some("n")).unwrap().as_deref(), Some("q"));
        assert_eq!(read_answer(&mut input, Some("n")).unwrap(), None);
        assert_eq!(read_answer(&mut io::empty(), Some("n")).unwrap(), None);
    }
}
