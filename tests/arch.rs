use tartan::testing::cycle_graph;
use tartan::{Arch, Num};

#[test]
fn complete_graph_terminals_are_all_at_distance_one() -> anyhow::Result<()> {
    let arch = Arch::complete(4)?;
    for a in 0..4 {
        for b in 0..4 {
            let da = arch.dom_term(a)?;
            let db = arch.dom_term(b)?;
            let expected = if a == b { 0 } else { 1 };
            assert_eq!(arch.dom_dist(&da, &db), expected);
        }
    }
    Ok(())
}

#[test]
fn hypercube_distance_counts_differing_bits() -> anyhow::Result<()> {
    let arch = Arch::hypercube(2)?;
    let t = |n: usize| arch.dom_term(n).unwrap();
    assert_eq!(arch.dom_dist(&t(0), &t(1)), 1);
    assert_eq!(arch.dom_dist(&t(2), &t(3)), 1);
    assert_eq!(arch.dom_dist(&t(0), &t(3)), 2);
    assert_eq!(arch.dom_dist(&t(1), &t(2)), 2);
    assert_eq!(arch.dom_dist(&t(3), &t(3)), 0);
    Ok(())
}

#[test]
fn mesh_and_torus_distances() -> anyhow::Result<()> {
    let mesh = Arch::mesh2(4, 1)?;
    let torus = Arch::torus2(4, 1)?;
    let m = |n: usize| mesh.dom_term(n).unwrap();
    let t = |n: usize| torus.dom_term(n).unwrap();
    assert_eq!(mesh.dom_dist(&m(0), &m(3)), 3);
    assert_eq!(torus.dom_dist(&t(0), &t(3)), 1); // wraps around
    assert_eq!(torus.dom_dist(&t(0), &t(2)), 2);
    Ok(())
}

#[test]
fn every_architecture_bipartitions_to_its_terminals() -> anyhow::Result<()> {
    let archs = vec![
        Arch::complete(7)?,
        Arch::complete_weighted(vec![1, 2, 3, 4])?,
        Arch::mesh2(3, 3)?,
        Arch::mesh3(2, 2, 2)?,
        Arch::torus2(2, 4)?,
        Arch::torus3(2, 2, 3)?,
        Arch::hypercube(3)?,
        Arch::tree_leaf(vec![2, 3], vec![2, 1])?,
    ];
    for arch in archs {
        let mut stack = vec![arch.first_domain()];
        let mut terminals = Vec::new();
        while let Some(dom) = stack.pop() {
            assert!(arch.dom_size(&dom) >= 1);
            assert!(arch.dom_weight(&dom) >= 1);
            assert_eq!(arch.dom_dist(&dom, &dom), 0);
            match arch.dom_bipart(&dom) {
                Some((a, b)) => {
                    assert_eq!(arch.dom_size(&a) + arch.dom_size(&b), arch.dom_size(&dom));
                    stack.push(a);
                    stack.push(b);
                }
                None => {
                    terminals.push(arch.dom_terminal_num(&dom).unwrap());
                }
            }
        }
        terminals.sort_unstable();
        let expected: Vec<usize> = (0..arch.size()).collect();
        assert_eq!(terminals, expected, "incomplete terminal coverage");
    }
    Ok(())
}

#[test]
fn weighted_complete_split_balances_capacity() -> anyhow::Result<()> {
    let arch = Arch::complete_weighted(vec![5, 1, 1, 1])?;
    let (a, b) = arch.dom_bipart(&arch.first_domain()).unwrap();
    let (wa, wb) = (arch.dom_weight(&a), arch.dom_weight(&b));
    assert_eq!(wa + wb, 8);
    assert!((wa - wb).abs() <= 2, "lopsided split {wa}/{wb}");
    Ok(())
}

#[test]
fn tree_leaf_distance_grows_toward_the_root() -> anyhow::Result<()> {
    // Two levels: arity 2 then 2; climbing the top level costs 3 per
    // side, the bottom level 1 per side.
    let arch = Arch::tree_leaf(vec![2, 2], vec![3, 1])?;
    let t = |n: usize| arch.dom_term(n).unwrap();
    assert_eq!(arch.dom_dist(&t(0), &t(1)), 2); // siblings
    assert_eq!(arch.dom_dist(&t(0), &t(2)), 8); // across the root
    Ok(())
}

#[test]
fn decomposition_architecture_from_a_ring() -> anyhow::Result<()> {
    let target = cycle_graph(6);
    let arch = Arch::decomposition(&target)?;
    assert_eq!(arch.size(), 6);
    let t = |n: usize| arch.dom_term(n).unwrap();
    assert_eq!(arch.dom_dist(&t(0), &t(3)), 3);
    assert_eq!(arch.dom_dist(&t(0), &t(5)), 1);

    let mut stack = vec![arch.first_domain()];
    let mut count = 0;
    while let Some(dom) = stack.pop() {
        match arch.dom_bipart(&dom) {
            Some((a, b)) => {
                stack.push(a);
                stack.push(b);
            }
            None => count += 1,
        }
    }
    assert_eq!(count, 6);

    let weights: Num = (0..6)
        .map(|n| arch.dom_weight(&t(n)))
        .sum();
    assert_eq!(weights, target.load_sum());
    Ok(())
}
