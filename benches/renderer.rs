use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rbtree_viz::config::{Config, LayoutConfig};
use rbtree_viz::ir::{ColorTag, NodeId, TreeData, TreeNode};
use rbtree_viz::layout::compute_layout;
use rbtree_viz::model::validate;
use rbtree_viz::render_tree_svg;
use rbtree_viz::session::Session;
use std::hint::black_box;

fn balanced_nodes(count: usize) -> Vec<TreeNode> {
    fn build(lo: i64, hi: i64, parent: Option<NodeId>, depth: usize, out: &mut Vec<TreeNode>) -> Option<NodeId> {
        if lo > hi {
            return None;
        }
        let mid = lo + (hi - lo) / 2;
        let color = if depth % 2 == 0 { ColorTag::Black } else { ColorTag::Red };
        let index = out.len();
        let mut node = TreeNode::new(mid, color);
        node.parent = parent;
        out.push(node);
        let left = build(lo, mid - 1, Some(mid), depth + 1, out);
        let right = build(mid + 1, hi, Some(mid), depth + 1, out);
        out[index].left = left;
        out[index].right = right;
        Some(mid)
    }
    let mut out = Vec::with_capacity(count);
    build(1, count as i64, None, 0, &mut out);
    out
}

fn chain_nodes(count: usize) -> Vec<TreeNode> {
    (1..=count as i64)
        .map(|id| {
            let mut node = TreeNode::new(id, ColorTag::Black);
            node.parent = (id > 1).then_some(id - 1);
            node.right = (id < count as i64).then_some(id + 1);
            node
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for (name, nodes) in [
        ("balanced_127", balanced_nodes(127)),
        ("balanced_4095", balanced_nodes(4095)),
        ("chain_1000", chain_nodes(1000)),
    ] {
        let tree = validate(&nodes).expect("valid tree");
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, tree| {
            b.iter(|| {
                let layout = compute_layout(black_box(tree), &config);
                black_box(layout.len());
            });
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for count in [127usize, 4095] {
        let nodes = balanced_nodes(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| black_box(validate(black_box(nodes)).map(|tree| tree.len())));
        });
    }
    group.finish();
}

fn bench_svg(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    let config = Config::default();
    for (name, nodes) in [("balanced_127", balanced_nodes(127)), ("chain_200", chain_nodes(200))] {
        let data = TreeData::from_nodes(&nodes);
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| black_box(render_tree_svg(black_box(data), &config).len()));
        });
    }
    group.finish();
}

fn bench_validation_sweep(c: &mut Criterion) {
    let data = TreeData::from_nodes(&balanced_nodes(1023));
    c.bench_function("validation_sweep_1023", |b| {
        b.iter(|| {
            let mut session = Session::default();
            session.draw(&data);
            session.on_validate_result(true);
            session.advance(std::time::Duration::from_secs(60));
            black_box(session.pending_timers());
        });
    });
}

criterion_group!(benches, bench_layout, bench_validate, bench_svg, bench_validation_sweep);
criterion_main!(benches);
