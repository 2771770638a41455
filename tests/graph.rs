use std::io::{BufReader, Write};
use tartan::graph::coarsen::{coarsen, MatchPolicy};
use tartan::graph::induce::{induce_halo, induce_list};
use tartan::graph::Num;
use tartan::io::{read_graph, write_graph};
use tartan::testing::{grid_graph, path_graph, random_mesh_graph, torus_graph};
use tartan::{Context, Graph};

#[test]
fn loaded_graph_round_trips_through_the_text_format() -> anyhow::Result<()> {
    let graph = Graph::from_weighted_edges(
        4,
        &[(0, 1, 3), (1, 2, 1), (2, 3, 5), (3, 0, 2)],
        Some(vec![2, 1, 1, 4]),
    )?;

    let mut file = tempfile::NamedTempFile::new()?;
    write_graph(&graph, &mut file)?;
    file.flush()?;
    let reread = read_graph(BufReader::new(file.reopen()?))?;

    assert_eq!(reread.vertnbr(), graph.vertnbr());
    assert_eq!(reread.edgenbr(), graph.edgenbr());
    assert_eq!(reread.load_sum(), graph.load_sum());
    assert_eq!(reread.edge_load_sum(), graph.edge_load_sum());
    reread.check()?;
    Ok(())
}

#[test]
fn reader_rejects_asymmetric_and_self_loop_inputs() {
    // Vertex 0 lists an edge to 1, but 1 lists none back.
    let asymmetric = "0\n2 1\n0 000\n1 1\n0\n";
    assert!(read_graph(BufReader::new(asymmetric.as_bytes())).is_err());

    let self_loop = "0\n1 1\n0 000\n1 0\n";
    assert!(read_graph(BufReader::new(self_loop.as_bytes())).is_err());
}

#[test]
fn one_based_files_keep_their_base() -> anyhow::Result<()> {
    let text = "0\n3 4\n1 000\n1 2\n2 1 3\n1 2\n";
    let graph = read_graph(BufReader::new(text.as_bytes()))?;
    assert_eq!(graph.base(), 1);
    assert_eq!(graph.vertnbr(), 3);
    assert_eq!(graph.neighbors(1), &[0, 2]);

    let mut out = Vec::new();
    write_graph(&graph, &mut out)?;
    let reread = read_graph(BufReader::new(out.as_slice()))?;
    assert_eq!(reread.base(), 1);
    assert_eq!(reread.edgenbr(), 4);
    Ok(())
}

#[test]
fn coarsening_conserves_loads() -> anyhow::Result<()> {
    let graph = grid_graph(10, 10);
    let mut ctx = Context::with_seed(5);
    let c = coarsen(&graph, MatchPolicy::HeavyEdge, &mut ctx);
    c.graph.check()?;
    assert_eq!(c.graph.load_sum(), graph.load_sum());

    // Edge loads lost are exactly the loads internal to multinodes.
    let mut internal: Num = 0;
    for (idx, &(a, b)) in c.multinodes.iter().enumerate() {
        assert_eq!(c.fine_to_coarse[a], idx);
        assert_eq!(c.fine_to_coarse[b], idx);
        if a != b {
            internal += graph
                .edge_range(a)
                .filter(|&e| graph.edge_target(e) == b)
                .map(|e| graph.edge_load(e))
                .sum::<Num>()
                * 2;
        }
    }
    assert_eq!(c.graph.edge_load_sum(), graph.edge_load_sum() - internal);
    Ok(())
}

#[test]
fn multilevel_coarsening_is_monotone_on_a_large_mesh() -> anyhow::Result<()> {
    // 1600 vertices; under the default ratio of 0.7 the level count must
    // stay within ceil(log(1600 / 120) / log(1 / 0.7)) = 8.
    let mut graph = grid_graph(40, 40);
    let mut ctx = Context::with_seed(2);
    let mut levels = 0;
    while graph.vertnbr() > 120 {
        let before = graph.vertnbr();
        let c = coarsen(&graph, MatchPolicy::HeavyEdge, &mut ctx);
        let ratio = c.graph.vertnbr() as f64 / before as f64;
        assert!(
            ratio <= 0.7,
            "level {levels}: ratio {ratio:.3} above the default threshold"
        );
        c.graph.check()?;
        graph = c.graph;
        levels += 1;
        assert!(levels <= 8, "too many coarsening levels");
    }
    Ok(())
}

#[test]
fn loaded_random_mesh_coarsening_conserves_loads() -> anyhow::Result<()> {
    // Non-unit vertex and edge loads from a seeded stream.
    let mut ctx = Context::with_seed(37);
    let graph = random_mesh_graph(12, 9, &mut ctx);
    let c = coarsen(&graph, MatchPolicy::HeavyEdge, &mut ctx);
    c.graph.check()?;
    assert_eq!(c.graph.load_sum(), graph.load_sum());
    assert!(c.graph.edge_load_sum() <= graph.edge_load_sum());
    Ok(())
}

#[test]
fn torus_partitions_like_its_grid_core() -> anyhow::Result<()> {
    let torus = torus_graph(8, 8);
    torus.check()?;
    let mut ctx = Context::with_seed(43);
    let parts = tartan::partition(&torus, 2, &mut ctx)?;
    let size0 = parts.iter().filter(|&&p| p == 0).count();
    assert!((29..=35).contains(&size0), "unbalanced split: {size0}/64");
    Ok(())
}

#[test]
fn signature_matching_pairs_twins() {
    // Two vertices with identical neighborhoods must mate.
    let graph = Graph::from_edges(4, &[(0, 2), (0, 3), (1, 2), (1, 3)]).unwrap();
    let mut ctx = Context::with_seed(1);
    let c = coarsen(&graph, MatchPolicy::Signature, &mut ctx);
    assert_eq!(c.graph.vertnbr(), 2);
}

#[test]
fn list_induction_is_symmetric_and_mapped() -> anyhow::Result<()> {
    let graph = grid_graph(5, 5);
    let verts: Vec<usize> = (0..25).filter(|v| v % 2 == 0).collect();
    let (sub, map) = induce_list(&graph, &verts);
    sub.check()?;
    assert_eq!(map, verts);
    Ok(())
}

#[test]
fn halo_induction_keeps_the_boundary_as_suffix() -> anyhow::Result<()> {
    let graph = path_graph(7);
    let (sub, map) = induce_halo(&graph, &[2, 3, 4]);
    sub.check()?;
    assert_eq!(sub.plain_count(), 3);
    assert_eq!(sub.halo_count(), 2); // vertices 1 and 5
    assert_eq!(&map[..3], &[2, 3, 4]);
    assert!(map[3..].contains(&1) && map[3..].contains(&5));
    // Halo vertices carry no outgoing adjacency.
    for v in 3..sub.graph().vertnbr() {
        assert_eq!(sub.graph().degree(v), 0);
    }
    Ok(())
}
