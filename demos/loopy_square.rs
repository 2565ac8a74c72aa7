//! Provides an example of running loopy on a graph that actually has a loop.
//!
//! Four variables sit in a cycle of soft agreement factors, with evidence
//! attached at one corner. Messages circulate the cycle, so the marginals are
//! approximate and take several rounds to settle; removing the evidence
//! factor afterwards lets them relax back toward uniform.

extern crate loopy;

use loopy::{FactorGraph, VariableHandle};

fn main() -> loopy::Result<()> {
    let tf = vec![true, false];

    /////////////////////////////////////////////////////
    // Step 1: Build the cycle W - X - Y - Z - W out of soft agreement
    // factors: adjacent variables prefer to agree by a factor of 2
    let mut graph = FactorGraph::new();
    let w = graph.add_variable("W", tf.clone())?;
    let x = graph.add_variable("X", tf.clone())?;
    let y = graph.add_variable("Y", tf.clone())?;
    let z = graph.add_variable("Z", tf.clone())?;

    let agree = |v: &[bool]| if v[0] == v[1] { 2.0 } else { 1.0 };
    graph.add_factor("W~X", &[w.into(), x.into()], agree)?;
    graph.add_factor("X~Y", &[x.into(), y.into()], agree)?;
    graph.add_factor("Y~Z", &[y.into(), z.into()], agree)?;
    graph.add_factor("Z~W", &[z.into(), w.into()], agree)?;

    /////////////////////////////////////////////////////
    // Step 2: Attach evidence at W
    let e = graph.add_constant("E", tf.clone(), &[0.8, 0.2])?;
    let observed = graph.add_factor("E=W", &[e.into(), w.into()], |v: &[bool]| {
        if v[0] == v[1] { 1.0 } else { 0.0 }
    })?;

    /////////////////////////////////////////////////////
    // Step 3: Iterate and watch the belief spread around the cycle
    println!("with evidence P(E) = [0.8, 0.2] at W:");
    for round in 1..9 {
        graph.run_round();
        print_row(&graph, round, &[("W", w), ("X", x), ("Y", y), ("Z", z)])?;
    }

    /////////////////////////////////////////////////////
    // Step 4: Drop the evidence factor (a structural edit, strictly between
    // rounds) and let the marginals relax
    graph.remove_factor(observed)?;

    println!("evidence removed:");
    for round in 1..9 {
        graph.run_round();
        print_row(&graph, round, &[("W", w), ("X", x), ("Y", y), ("Z", z)])?;
    }

    Ok(())
}

fn print_row(graph: &FactorGraph<bool>, round: usize, vars: &[(&str, VariableHandle)]) -> loopy::Result<()> {
    print!("  round {}:", round);
    for &(name, handle) in vars.iter() {
        let p = graph.marginal(handle)?;
        print!("  P({})=[{:.3}, {:.3}]", name, p[0], p[1]);
    }
    println!();
    Ok(())
}
