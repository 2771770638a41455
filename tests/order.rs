use std::io::BufReader;
use tartan::io::{read_ordering, write_ordering};
use tartan::order::OrderNode;
use tartan::stats::order_stats;
use tartan::strategy::parse;
use tartan::testing::{assert_permutation, grid_graph, path_graph};
use tartan::{order, order_with, Context, OrderMethod};

#[test]
fn path_of_six_orders_with_little_fill() -> anyhow::Result<()> {
    // Nested dissection down to blocks of two, separators numbered last.
    let graph = path_graph(6);
    let strat = parse::<OrderMethod>("n{vert=2,ole=d,ose=s}")?;
    let mut ctx = Context::with_seed(3);
    let ordering = order_with(&graph, &strat, &mut ctx)?;
    ordering.check()?;
    assert_permutation(ordering.permutation());

    let report = order_stats(&graph, &ordering)?;
    assert!(
        report.factor_nonzeros <= 9,
        "factor holds {} subdiagonal nonzeros",
        report.factor_nonzeros
    );
    Ok(())
}

#[test]
fn separators_are_numbered_after_their_descendants() -> anyhow::Result<()> {
    let graph = grid_graph(8, 8);
    let strat = parse::<OrderMethod>("n{vert=8}")?;
    let mut ctx = Context::with_seed(5);
    let ordering = order_with(&graph, &strat, &mut ctx)?;
    ordering.check()?;

    fn walk(node: &OrderNode) {
        if let OrderNode::Sep { children, lo, hi } = node {
            assert!(lo <= hi);
            for child in children {
                let (_, child_hi) = child.span();
                assert!(child_hi <= *lo, "separator numbered before a descendant");
                walk(child);
            }
        }
    }
    walk(ordering.tree());
    assert!(ordering.tree().block_count() > 1);
    Ok(())
}

#[test]
fn default_ordering_beats_natural_order_on_a_grid() -> anyhow::Result<()> {
    let graph = grid_graph(12, 12);
    let mut ctx = Context::with_seed(7);
    let dissected = order(&graph, &mut ctx)?;
    let report = order_stats(&graph, &dissected)?;

    let natural = order_with(
        &graph,
        &parse::<OrderMethod>("s")?,
        &mut Context::with_seed(7),
    )?;
    let natural_report = order_stats(&graph, &natural)?;

    assert!(
        report.factor_nonzeros <= natural_report.factor_nonzeros,
        "dissection ({}) should not fill more than natural order ({})",
        report.factor_nonzeros,
        natural_report.factor_nonzeros
    );
    Ok(())
}

#[test]
fn minimum_degree_orders_a_star_center_last() -> anyhow::Result<()> {
    let graph = tartan::testing::star_graph(6);
    let ordering = order_with(
        &graph,
        &parse::<OrderMethod>("d")?,
        &mut Context::with_seed(1),
    )?;
    assert_eq!(ordering.rank(0), 6);
    let report = order_stats(&graph, &ordering)?;
    assert_eq!(report.factor_nonzeros, 6); // a star factors without fill
    Ok(())
}

#[test]
fn ordering_is_deterministic_for_a_fixed_seed() -> anyhow::Result<()> {
    let graph = grid_graph(10, 10);
    let first = order(&graph, &mut Context::with_seed(23))?;
    let second = order(&graph, &mut Context::with_seed(23))?;
    assert_eq!(first.permutation(), second.permutation());
    Ok(())
}

#[test]
fn ordering_files_round_trip() -> anyhow::Result<()> {
    let graph = path_graph(5);
    let ordering = order(&graph, &mut Context::with_seed(2))?;
    let mut out = Vec::new();
    write_ordering(&graph, &ordering, &mut out)?;
    let pairs = read_ordering(BufReader::new(out.as_slice()))?;
    assert_eq!(pairs.len(), 5);
    for (v, &(label, rank)) in pairs.iter().enumerate() {
        assert_eq!(label, v as i64);
        assert_eq!(rank as usize, ordering.rank(v));
    }
    Ok(())
}

#[test]
fn disconnected_graphs_are_ordered_completely() -> anyhow::Result<()> {
    // Two components; dissection must still number every vertex.
    let graph = tartan::Graph::from_edges(6, &[(0, 1), (1, 2), (3, 4), (4, 5)])?;
    let strat = parse::<OrderMethod>("n{vert=2}")?;
    let ordering = order_with(&graph, &strat, &mut Context::with_seed(11))?;
    ordering.check()?;
    assert_permutation(ordering.permutation());
    Ok(())
}
