//! Provides an example of using loopy to push noisy boolean evidence through
//! logic-gate constraints.
//!
//! Two observations A and B are each believed true with probability 0.9. One
//! factor constrains C = A OR B, so P(C = true) = 1 - 0.1 * 0.1 = 0.99; the
//! AND rendition gives P(C = true) = 0.9 * 0.9 = 0.81.

extern crate loopy;

use loopy::FactorGraph;

fn main() -> loopy::Result<()> {
    run_gate("OR", |a, b| a || b)?;
    run_gate("AND", |a, b| a && b)?;
    Ok(())
}

fn run_gate(label: &str, gate: fn(bool, bool) -> bool) -> loopy::Result<()> {
    let tf = vec![true, false];

    /////////////////////////////////////////////////////
    // Step 1: Build the graph - evidence constants, an output variable, and
    // the gate constraint tying them together
    let mut graph = FactorGraph::new();
    let a = graph.add_constant("A", tf.clone(), &[0.9, 0.1])?;
    let b = graph.add_constant("B", tf.clone(), &[0.9, 0.1])?;
    let c = graph.add_variable("C", tf.clone())?;

    graph.add_factor("gate", &[a.into(), b.into(), c.into()], move |v: &[bool]| {
        if v[2] == gate(v[0], v[1]) { 1.0 } else { 0.0 }
    })?;

    /////////////////////////////////////////////////////
    // Step 2: Run message-passing rounds and read the marginal. The graph is
    // a tree, so one round already settles it.
    println!("C = A {} B", label);
    for round in 1..4 {
        graph.run_round();

        let p = graph.marginal(c)?;
        println!("  round {}: P(C) = [{:.4}, {:.4}]", round, p[0], p[1]);
    }

    Ok(())
}
