use std::io::BufReader;
use tartan::io::{read_mapping, write_mapping};
use tartan::stats::mapping_stats;
use tartan::testing::{assert_balanced, cut_load, grid_graph, part_loads, star_graph};
use tartan::{map, partition, Arch, Context, KwayGraph, Num};

#[test]
fn square_grid_partitions_into_two_equal_halves() -> anyhow::Result<()> {
    // 2x2 grid: both balanced splits cut exactly two edges.
    let graph = grid_graph(2, 2);
    let mut ctx = Context::with_seed(1);
    let parts = partition(&graph, 2, &mut ctx)?;
    assert_eq!(parts.iter().filter(|&&p| p == 0).count(), 2);
    assert_eq!(cut_load(&graph, &parts), 2);
    Ok(())
}

#[test]
fn star_partition_is_reproducible() -> anyhow::Result<()> {
    let graph = star_graph(5);
    let first = partition(&graph, 2, &mut Context::with_seed(5))?;
    let second = partition(&graph, 2, &mut Context::with_seed(5))?;
    assert_eq!(first, second);
    assert_eq!(cut_load(&graph, &first), 3);
    Ok(())
}

#[test]
fn four_way_partition_balances_a_grid() -> anyhow::Result<()> {
    let graph = grid_graph(8, 8);
    let mut ctx = Context::with_seed(9);
    let parts = partition(&graph, 4, &mut ctx)?;
    assert_balanced(&graph, &parts, 4, 0.05);
    // Two straight cuts give 16; leave slack for local minima.
    assert!(cut_load(&graph, &parts) <= 32);
    Ok(())
}

#[test]
fn mapping_onto_a_hypercube_has_consistent_statistics() -> anyhow::Result<()> {
    let graph = grid_graph(8, 8);
    let arch = Arch::hypercube(2)?;
    let mut ctx = Context::with_seed(13);
    let mapping = map(&graph, &arch, &mut ctx)?;
    let stats = mapping_stats(&graph, &mapping)?;
    assert_eq!(stats.target_count, 4);
    assert!(stats.used_count >= 2);
    assert!(stats.comm_load >= stats.edge_cut); // dilation is at least 1
    assert!(stats.imbalance < 1.3, "imbalance {}", stats.imbalance);

    // The cached communication load matches a recomputation from parts.
    let terminals = mapping.terminals()?;
    let mut comm = 0;
    for v in 0..graph.vertnbr() {
        for e in graph.edge_range(v) {
            let u = graph.edge_target(e);
            if terminals[v] != terminals[u] {
                comm += graph.edge_load(e)
                    * arch.dom_dist(
                        &arch.dom_term(terminals[v])?,
                        &arch.dom_term(terminals[u])?,
                    );
            }
        }
    }
    assert_eq!(stats.comm_load, comm / 2);
    Ok(())
}

#[test]
fn mapping_onto_a_mesh_keeps_every_terminal_loaded() -> anyhow::Result<()> {
    let graph = grid_graph(12, 12);
    let arch = Arch::mesh2(3, 2)?;
    let mut ctx = Context::with_seed(17);
    let mapping = map(&graph, &arch, &mut ctx)?;
    let terminals = mapping.terminals()?;
    let loads = part_loads(&graph, &terminals, 6);
    assert!(loads.iter().all(|&l| l > 0), "terminal left empty: {loads:?}");
    Ok(())
}

#[test]
fn weighted_complete_targets_get_proportional_loads() -> anyhow::Result<()> {
    let graph = grid_graph(8, 8);
    let arch = Arch::complete_weighted(vec![3, 1])?;
    let mut ctx = Context::with_seed(19);
    let mapping = map(&graph, &arch, &mut ctx)?;
    let terminals = mapping.terminals()?;
    let loads = part_loads(&graph, &terminals, 2);
    // Terminal 0 holds three quarters of the load, give or take.
    assert!(
        (loads[0] - 48).abs() <= 6,
        "capacity-weighted loads off target: {loads:?}"
    );
    Ok(())
}

#[test]
fn fixed_vertices_stay_where_they_are_put() -> anyhow::Result<()> {
    let graph = grid_graph(6, 6);
    let arch = Arch::complete(2)?;
    let mut kg = KwayGraph::new(graph.clone(), arch, 0.1);
    // Pin two opposite corners to different terminals.
    let mut fixed = vec![-1isize; 36];
    fixed[0] = 0;
    fixed[35] = 1;
    kg.set_fixed(fixed)?;

    let mut ctx = Context::with_seed(23);
    ctx.commit()?;
    tartan::kway::default_strategy().run(&mut kg, &mut ctx)?;
    kg.check()?;
    let terminals = kg.mapping().terminals()?;
    assert_eq!(terminals[0], 0);
    assert_eq!(terminals[35], 1);
    Ok(())
}

#[test]
fn mapping_files_round_trip() -> anyhow::Result<()> {
    let graph = grid_graph(4, 4);
    let arch = Arch::complete(4)?;
    let mapping = map(&graph, &arch, &mut Context::with_seed(29))?;
    let mut out = Vec::new();
    write_mapping(&graph, &mapping, &mut out)?;
    let pairs = read_mapping(BufReader::new(out.as_slice()))?;
    let terminals = mapping.terminals()?;
    assert_eq!(pairs.len(), 16);
    for (v, &(label, value)) in pairs.iter().enumerate() {
        assert_eq!(label, v as Num);
        assert_eq!(value as usize, terminals[v]);
    }
    Ok(())
}

#[test]
fn partitions_are_deterministic_per_seed_and_vary_across_seeds() -> anyhow::Result<()> {
    let graph = grid_graph(10, 10);
    let a = partition(&graph, 4, &mut Context::with_seed(101))?;
    let b = partition(&graph, 4, &mut Context::with_seed(101))?;
    assert_eq!(a, b);

    // Different seeds may legitimately coincide, but the cut must stay
    // reasonable either way.
    let c = partition(&graph, 4, &mut Context::with_seed(202))?;
    assert!(cut_load(&graph, &c) <= 40);
    assert_balanced(&graph, &c, 4, 0.05);
    Ok(())
}
