use tartan::strategy::parse;
use tartan::testing::grid_graph;
use tartan::{partition_with, BipartMethod, Context, Error, MapMethod, OrderMethod, SepMethod, Strategy};

#[test]
fn multilevel_strategy_string_parses_and_runs() -> anyhow::Result<()> {
    // Coarsening to 10 vertices, greedy growing at the base, FM on the
    // way back up, driven from the mapping level.
    let bipart = parse::<BipartMethod>("m{vert=10,low=h{pass=5},asc=f{move=20,bal=0.05}}")?;
    let strat: Strategy<MapMethod> = parse::<MapMethod>(
        "r{bal=0.05,sep=m{vert=10,low=h{pass=5},asc=f{move=20,bal=0.05}}}",
    )?;

    match &bipart {
        Strategy::Method(BipartMethod::Multilevel(p)) => {
            assert_eq!(p.vert, 10);
        }
        other => panic!("unexpected tree {other:?}"),
    }

    // 25 vertices force at least one coarsening level below vert=10.
    let graph = grid_graph(5, 5);
    let mut ctx = Context::with_seed(9);
    let parts = partition_with(&graph, 2, &strat, &mut ctx)?;
    let size0 = parts.iter().filter(|&&p| p == 0).count();
    assert!((11..=13).contains(&size0), "unbalanced split: {size0}/25");
    Ok(())
}

#[test]
fn parse_print_parse_is_identity() -> anyhow::Result<()> {
    let sources = [
        "m{vert=10,low=h{pass=5},asc=f{move=20,bal=0.05}}",
        "h|f{move=3,pass=2,bal=0.1}",
        "(h|z)f",
        "/vert<100?h:f;",
        "/((vert*2)>(load+1))&(levl=0)?h;z",
        "b{width=2,bnd=d{pass=40,type=b},org=f}",
        "",
    ];
    for src in sources {
        let first = parse::<BipartMethod>(src)?;
        let printed = first.to_string();
        let second = parse::<BipartMethod>(&printed)?;
        assert_eq!(first, second, "round trip changed {src:?} -> {printed:?}");
    }
    Ok(())
}

#[test]
fn errors_carry_line_and_column() {
    let err = parse::<BipartMethod>("m{vert=10,\nbogus=3}").unwrap_err();
    match err {
        Error::StrategyParse { line, column, .. } => {
            assert_eq!(line, 2);
            assert!(column > 1);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unknown_method_and_unterminated_group_are_rejected() {
    assert!(parse::<BipartMethod>("q").is_err());
    assert!(parse::<BipartMethod>("(h|f").is_err());
    assert!(parse::<BipartMethod>("m{vert=}").is_err());
    assert!(parse::<SepMethod>("/vert<10?h").is_err());
}

#[test]
fn deprecated_parameters_parse_but_do_nothing() -> anyhow::Result<()> {
    let with = parse::<BipartMethod>("d{pass=7,dif=0.6,rem=0.4}")?;
    let without = parse::<BipartMethod>("d{pass=7}")?;
    assert_eq!(with, without);
    Ok(())
}

#[test]
fn parameter_prefixes_are_accepted() -> anyhow::Result<()> {
    let long = parse::<BipartMethod>("f{move=12,pass=3,bal=0.2}")?;
    let short = parse::<BipartMethod>("f{m=12,p=3,b=0.2}")?;
    assert_eq!(long, short);
    Ok(())
}

#[test]
fn selection_keeps_the_better_branch() -> anyhow::Result<()> {
    use tartan::bipart::BipartGraph;

    // `z` leaves everything in part 0 (unbalanced); `h` balances. The
    // selection must keep the balanced outcome.
    let strat = parse::<BipartMethod>("z|h{pass=4}")?;
    let graph = grid_graph(4, 4);
    let mut ctx = Context::with_seed(3);
    ctx.commit()?;
    let mut bg = BipartGraph::new(graph, [1, 1], 1, 0.1);
    strat.run(&mut bg, &mut ctx)?;
    assert!(bg.parts().iter().any(|&p| p == 1));
    bg.check()?;
    Ok(())
}

#[test]
fn conditions_read_graph_attributes() -> anyhow::Result<()> {
    use tartan::bipart::BipartGraph;

    // vert = 16 here, so the condition picks the growing branch.
    let strat = parse::<BipartMethod>("/vert>10?h{pass=3}:z;")?;
    let graph = grid_graph(4, 4);
    let mut ctx = Context::with_seed(3);
    ctx.commit()?;
    let mut bg = BipartGraph::new(graph, [1, 1], 1, 0.1);
    strat.run(&mut bg, &mut ctx)?;
    assert!(bg.parts().iter().any(|&p| p == 1));
    Ok(())
}

#[test]
fn empty_strategy_strings_fall_back_to_defaults() -> anyhow::Result<()> {
    let map_default = tartan::map_strategy("")?;
    assert!(matches!(map_default, Strategy::Method(MapMethod::Multilevel(_))));
    let order_default = tartan::order_strategy("  ")?;
    assert!(matches!(order_default, Strategy::Method(OrderMethod::Nd(_))));
    Ok(())
}
