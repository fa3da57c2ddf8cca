//! Property tests over randomly generated graphs.
//!
//! Graphs are small (up to 12 nodes) with arbitrary link types, strengths,
//! duplicates and self loops so the degenerate shapes get exercised too.

use graph_view_engine::analytics::local_clustering;
use graph_view_engine::layout::layout;
use graph_view_engine::{
    analyze, filter, find_path, GraphFilters, LayoutSettings, LayoutType, Link, LinkType, Node,
    NodeType, PathMode,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn arb_node_type() -> impl Strategy<Value = NodeType> {
    prop_oneof![
        Just(NodeType::File),
        Just(NodeType::Folder),
        Just(NodeType::Database),
        Just(NodeType::Tag),
    ]
}

fn arb_link_type() -> impl Strategy<Value = LinkType> {
    prop_oneof![
        Just(LinkType::Link),
        Just(LinkType::Backlink),
        Just(LinkType::Tag),
        Just(LinkType::Parent),
    ]
}

prop_compose! {
    fn arb_graph()(n in 1usize..12)(
        types in prop::collection::vec(arb_node_type(), n),
        edges in prop::collection::vec((0..n, 0..n, arb_link_type(), 0.0f64..=1.0), 0..(n * 3)),
    ) -> (Vec<Node>, Vec<Link>) {
        let nodes = types
            .into_iter()
            .enumerate()
            .map(|(i, t)| Node::new(format!("n{i}"), format!("Node {i}"), t))
            .collect();
        let links = edges
            .into_iter()
            .map(|(a, b, t, s)| Link::new(format!("n{a}"), format!("n{b}"), t).with_strength(s))
            .collect();
        (nodes, links)
    }
}

prop_compose! {
    fn arb_filters()(
        search in prop_oneof![Just(String::new()), Just("node 1".to_string()), Just("zzz".to_string())],
        types in prop::option::of(prop::collection::vec(arb_node_type(), 0..3)),
        min_connections in 0usize..4,
        show_orphans in any::<bool>(),
    ) -> GraphFilters {
        let mut filters = GraphFilters::default()
            .with_search(search)
            .with_min_connections(min_connections)
            .with_orphans(show_orphans);
        filters.node_types = types;
        filters
    }
}

/// Is there an undirected path between `a` and `b` over non-self links?
fn connected(links: &[Link], a: &str, b: &str) -> bool {
    let mut seen = HashSet::from([a.to_string()]);
    let mut stack = vec![a.to_string()];
    while let Some(v) = stack.pop() {
        if v == b {
            return true;
        }
        for link in links.iter().filter(|l| !l.is_self_loop()) {
            if let Some(w) = link.other_end(&v) {
                if seen.insert(w.to_string()) {
                    stack.push(w.to_string());
                }
            }
        }
    }
    false
}

proptest! {
    #[test]
    fn filtering_never_leaves_dangling_links(
        (nodes, links) in arb_graph(),
        filters in arb_filters(),
    ) {
        let (kept_nodes, kept_links) = filter(&nodes, &links, &filters);
        let ids: HashSet<&str> = kept_nodes.iter().map(|n| n.id.as_str()).collect();
        for link in &kept_links {
            prop_assert!(ids.contains(link.source.as_str()));
            prop_assert!(ids.contains(link.target.as_str()));
        }
        if !filters.show_orphans {
            for node in &kept_nodes {
                prop_assert!(kept_links.iter().any(|l| l.touches(&node.id)));
            }
        }
    }

    #[test]
    fn metrics_stay_in_range((nodes, links) in arb_graph()) {
        let analysis = analyze(&nodes, &links);
        prop_assert!((0.0..=1.0).contains(&analysis.density));
        prop_assert!((0.0..=1.0).contains(&analysis.clustering));
        for value in local_clustering(&nodes, &links).values() {
            prop_assert!((0.0..=1.0).contains(value));
        }
        for metrics in analysis.centrality.values() {
            prop_assert!(metrics.betweenness.is_finite() && metrics.betweenness >= 0.0);
            prop_assert!((0.0..=1.0 + 1e-9).contains(&metrics.closeness));
        }
        let members: usize = analysis.communities.iter().map(|c| c.size()).sum();
        prop_assert_eq!(members, nodes.len());
    }

    #[test]
    fn analysis_is_repeatable((nodes, links) in arb_graph()) {
        prop_assert_eq!(analyze(&nodes, &links), analyze(&nodes, &links));
    }

    #[test]
    fn path_to_self_and_symmetry(
        (nodes, links) in arb_graph(),
        a in 0usize..12,
        b in 0usize..12,
    ) {
        let a = format!("n{}", a % nodes.len());
        let b = format!("n{}", b % nodes.len());

        let own = find_path(&nodes, &links, &a, &a, PathMode::Weighted);
        prop_assert!(own.found);
        prop_assert_eq!(own.path, vec![a.clone()]);
        prop_assert_eq!(own.distance, 0.0);

        for mode in [PathMode::Weighted, PathMode::Unweighted] {
            let forward = find_path(&nodes, &links, &a, &b, mode);
            let backward = find_path(&nodes, &links, &b, &a, mode);
            prop_assert_eq!(forward.found, backward.found);
            prop_assert_eq!(forward.found, connected(&links, &a, &b));
            if forward.found {
                prop_assert_eq!(forward.distance, backward.distance);
                let mut reversed = backward.path.clone();
                reversed.reverse();
                prop_assert_eq!(&forward.path, &reversed);
                prop_assert_eq!(forward.path.first(), Some(&a));
                prop_assert_eq!(forward.path.last(), Some(&b));
            } else {
                prop_assert!(forward.distance.is_infinite());
            }
        }
    }

    #[test]
    fn cluster_ids_match_connectivity((nodes, links) in arb_graph()) {
        let placed = layout(&nodes, &links, &LayoutSettings::of_type(LayoutType::Cluster));
        for x in &placed {
            prop_assert!(x.position.is_some());
            for y in &placed {
                if x.id == y.id {
                    continue;
                }
                let together = x.cluster.is_some() && x.cluster == y.cluster;
                prop_assert_eq!(together, connected(&links, &x.id, &y.id));
            }
        }
    }

    #[test]
    fn hierarchy_puts_children_below_parents(
        n in 2usize..12,
        parents in prop::collection::vec(any::<prop::sample::Index>(), 11),
    ) {
        // a random forest: node i > 0 hangs under some j < i
        let nodes: Vec<Node> = (0..n)
            .map(|i| Node::new(format!("n{i}"), format!("n{i}"), NodeType::Folder))
            .collect();
        let links: Vec<Link> = (1..n)
            .map(|i| Link::new(format!("n{}", parents[i - 1].index(i)), format!("n{i}"), LinkType::Parent))
            .collect();

        let placed = layout(&nodes, &links, &LayoutSettings::of_type(LayoutType::Hierarchical));
        let y = |id: &str| placed.iter().find(|n| n.id == id).and_then(|n| n.position).map(|p| p.y);
        for link in &links {
            prop_assert!(y(&link.target) > y(&link.source));
        }
    }
}
