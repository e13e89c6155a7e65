//! Implementation of the `graph`, `topics` and `next-level` commands.

use super::runtime::Runtime;
use crate::cli::{NextLevelArgs, TopicsArgs};
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::taxonomy::TopicDefinition;

/// Execute the `exforge graph` command.
///
/// Any dangling reference or cycle fails the command with every issue listed.
pub fn cmd_graph(runtime: &Runtime) -> Result<()> {
    let index = runtime.registry.snapshot()?;
    let graph = DependencyGraph::from_index(&index);
    let order = graph.learning_order()?;

    println!(
        "Prerequisite graph OK: {} topic(s), {} edge(s).",
        order.len(),
        graph.edges().len()
    );
    println!();
    println!("Learning order:");
    for (position, topic_id) in order.iter().enumerate() {
        let name = index
            .topic(topic_id)
            .map(|t| t.display_name.as_str())
            .unwrap_or(topic_id);
        println!("  {:>2}. {} ({})", position + 1, topic_id, name);
    }
    Ok(())
}

/// Execute the `exforge topics` command.
pub fn cmd_topics(runtime: &Runtime, args: TopicsArgs) -> Result<()> {
    let topics: Vec<TopicDefinition> = match &args.level {
        Some(level) => runtime.registry.topics_for_level(level.trim())?,
        None => runtime.registry.snapshot()?.topics().to_vec(),
    };

    if topics.is_empty() {
        println!("No topics.");
        return Ok(());
    }

    for topic in &topics {
        let mut line = format!("{:<20} {}", topic.id, topic.display_name);
        if !topic.category.is_empty() {
            line.push_str(&format!(" [{}]", topic.category));
        }
        if !topic.prerequisites.is_empty() {
            line.push_str(&format!(" (requires {})", topic.prerequisites.join(", ")));
        }
        println!("{}", line);
    }
    Ok(())
}

/// Execute the `exforge next-level` command.
pub fn cmd_next_level(runtime: &Runtime, args: NextLevelArgs) -> Result<()> {
    let level_id = args.level.trim();
    match runtime.registry.next_level(level_id)? {
        Some(next) => println!("{} -> {} ({})", level_id, next.id, next.display_name),
        None => println!("'{}' is the highest level.", level_id),
    }
    Ok(())
}
