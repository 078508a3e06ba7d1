//! The dependency analyzer — accumulates parse records and derives graphs.
//!
//! Holds the project's file table keyed by file id and answers every
//! cross-file question: import resolution, file and function graphs,
//! centrality, cycles, dead code. Resolution never touches the filesystem;
//! it is a pure function of the file id set and the alias table, so results
//! are replayable.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::alias::AliasTable;
use super::types::{
    CallEdge, DeadCode, DependencyGraph, FileDependencies, FunctionCallGraph, FunctionNode,
    ImportEdge, NodeStats,
};
use crate::parser::{SourceFile, RESOLVE_EXTENSIONS};

/// Conventional entry filenames that are never reported as dead even with
/// zero inbound imports.
pub const DEFAULT_ENTRY_FILES: &[&str] = &[
    "main.py",
    "app.py",
    "__main__.py",
    "manage.py",
    "setup.py",
    "index.js",
    "index.ts",
    "main.js",
    "main.ts",
    "app.js",
    "server.js",
    "main.rs",
    "lib.rs",
    "main.go",
    "Main.java",
    "Program.cs",
];

pub struct DependencyAnalyzer {
    files: BTreeMap<String, SourceFile>,
    aliases: AliasTable,
}

impl DependencyAnalyzer {
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            files: BTreeMap::new(),
            aliases,
        }
    }

    /// Upsert a parse record. Re-adding an id replaces the previous record,
    /// which is what incremental rescans rely on.
    pub fn add_file(&mut self, file: SourceFile) {
        self.files.insert(file.id.clone(), file);
    }

    /// Drop a file that disappeared between scans.
    pub fn remove_file(&mut self, file_id: &str) -> bool {
        self.files.remove(file_id).is_some()
    }

    pub fn file(&self, file_id: &str) -> Option<&SourceFile> {
        self.files.get(file_id)
    }

    pub fn files(&self) -> &BTreeMap<String, SourceFile> {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    // ─── Import Resolution ──────────────────────────────────────

    /// Map an import specifier to a project-internal file id.
    ///
    /// Priority: alias rewrite, then relative, then root-relative module
    /// path; anything else is external (`None`). Whichever step claims the
    /// specifier commits the result — an alias that rewrites to a missing
    /// file stays unresolved rather than falling through.
    pub fn resolve_import(&self, source_id: &str, raw_specifier: &str) -> Option<String> {
        if let Some(rewritten) = self.aliases.resolve(raw_specifier) {
            let base = normalize_path(&rewritten)?;
            return self.first_candidate(&base);
        }

        if raw_specifier.starts_with('.') {
            let base = self.relative_base(source_id, raw_specifier)?;
            return self.first_candidate(&base);
        }

        if let Some(module_path) = module_path(raw_specifier) {
            return self.first_candidate(&module_path);
        }

        None
    }

    /// Try the fixed candidate ladder against the in-memory id set: exact,
    /// then each supported extension, then `/index` + each extension.
    fn first_candidate(&self, base: &str) -> Option<String> {
        if base.is_empty() {
            return None;
        }
        let mut hit: Option<String> = None;
        let mut extra = 0usize;
        let try_candidate = |candidate: String, hit: &mut Option<String>, extra: &mut usize| {
            if self.files.contains_key(&candidate) {
                if hit.is_none() {
                    *hit = Some(candidate);
                } else {
                    *extra += 1;
                }
            }
        };

        try_candidate(base.to_string(), &mut hit, &mut extra);
        for ext in RESOLVE_EXTENSIONS {
            try_candidate(format!("{base}{ext}"), &mut hit, &mut extra);
        }
        for ext in RESOLVE_EXTENSIONS {
            try_candidate(format!("{base}/index{ext}"), &mut hit, &mut extra);
        }

        if extra > 0 {
            debug!(
                base,
                resolved = hit.as_deref().unwrap_or(""),
                ambiguous = extra,
                "multiple candidate suffixes matched, keeping the first"
            );
        }
        hit
    }

    /// Resolve a relative specifier against the importing file's directory.
    /// Handles both path-style (`./util`, `../pkg/mod`) and dotted-style
    /// (`.sibling`, `..pkg.mod`) markers.
    fn relative_base(&self, source_id: &str, raw_specifier: &str) -> Option<String> {
        let dir = match source_id.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        };

        if raw_specifier.starts_with("./") || raw_specifier.starts_with("../") {
            let joined = if dir.is_empty() {
                raw_specifier.to_string()
            } else {
                format!("{dir}/{raw_specifier}")
            };
            return normalize_path(&joined);
        }

        // Dotted style: each leading dot past the first climbs one level.
        let dots = raw_specifier.chars().take_while(|c| *c == '.').count();
        let rest = &raw_specifier[dots..];
        let mut parts: Vec<&str> = if dir.is_empty() {
            Vec::new()
        } else {
            dir.split('/').collect()
        };
        for _ in 1..dots {
            parts.pop()?;
        }
        if !rest.is_empty() {
            parts.extend(rest.split('.'));
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("/"))
    }

    // ─── File Graph ─────────────────────────────────────────────

    /// Build the file-level dependency graph with degree and centrality
    /// stats. Every import becomes an edge; unresolved ones carry no
    /// target. Degrees count distinct importer/imported pairs so a file
    /// imported twice from one place does not inflate its centrality.
    pub fn build_file_graph(&self) -> DependencyGraph {
        let mut edges = Vec::new();
        let mut pairs: BTreeSet<(&str, String)> = BTreeSet::new();

        for (id, file) in &self.files {
            for import in &file.imports {
                let target = self.resolve_import(id, &import.raw_specifier);
                if let Some(ref target) = target {
                    pairs.insert((id.as_str(), target.clone()));
                }
                edges.push(ImportEdge {
                    source_id: id.clone(),
                    target_id: target,
                    raw_specifier: import.raw_specifier.clone(),
                    imported_items: import.imported_items.clone(),
                });
            }
        }

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut out_degree: HashMap<&str, usize> = HashMap::new();
        for (source, target) in &pairs {
            *out_degree.entry(*source).or_default() += 1;
            *in_degree.entry(target.as_str()).or_default() += 1;
        }

        let total = self.files.len();
        let denom = total.saturating_sub(1).max(1) as f64;

        let nodes = self
            .files
            .iter()
            .map(|(id, file)| {
                let in_deg = in_degree.get(id.as_str()).copied().unwrap_or(0);
                let out_deg = out_degree.get(id.as_str()).copied().unwrap_or(0);
                (
                    id.clone(),
                    NodeStats {
                        size_bytes: file.size_bytes,
                        line_count: file.line_count,
                        language: file.language,
                        in_degree: in_deg,
                        out_degree: out_deg,
                        centrality: in_deg as f64 / denom,
                    },
                )
            })
            .collect();

        DependencyGraph { nodes, edges }
    }

    // ─── Function Graph ─────────────────────────────────────────

    /// Build the function-level call graph. An edge is added only when the
    /// callee's bare name is defined exactly once across the whole project;
    /// ambiguous names are dropped. This is a documented precision limit,
    /// not something to paper over with guesses.
    pub fn build_function_graph(&self) -> FunctionCallGraph {
        let mut nodes: BTreeMap<String, FunctionNode> = BTreeMap::new();
        let mut name_index: HashMap<&str, Vec<String>> = HashMap::new();

        for (id, file) in &self.files {
            for func in &file.functions {
                let key = format!("{id}#{}", func.name);
                name_index.entry(func.name.as_str()).or_default().push(key.clone());
                nodes.insert(
                    key,
                    FunctionNode {
                        name: func.name.clone(),
                        file_id: id.clone(),
                        line_start: func.line_start,
                        line_end: func.line_end,
                        parameters: func.parameters.clone(),
                    },
                );
            }
            for class in &file.classes {
                for method in &class.methods {
                    let key = format!("{id}#{}.{}", class.name, method.name);
                    name_index
                        .entry(method.name.as_str())
                        .or_default()
                        .push(key.clone());
                    nodes.insert(
                        key,
                        FunctionNode {
                            name: format!("{}.{}", class.name, method.name),
                            file_id: id.clone(),
                            line_start: method.line_start,
                            line_end: method.line_end,
                            parameters: method.parameters.clone(),
                        },
                    );
                }
            }
        }

        let mut edges = Vec::new();
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        for (id, file) in &self.files {
            let callers = file.functions.iter().map(|f| (format!("{id}#{}", f.name), f)).chain(
                file.classes.iter().flat_map(|c| {
                    c.methods
                        .iter()
                        .map(move |m| (format!("{id}#{}.{}", c.name, m.name), m))
                }),
            );
            for (caller_key, func) in callers {
                for call in &func.calls {
                    let Some(targets) = name_index.get(call.as_str()) else { continue };
                    if targets.len() != 1 {
                        continue;
                    }
                    let callee_key = targets[0].clone();
                    if seen.insert((caller_key.clone(), callee_key.clone())) {
                        edges.push(CallEdge {
                            caller: caller_key.clone(),
                            callee: callee_key,
                        });
                    }
                }
            }
        }

        FunctionCallGraph { nodes, edges }
    }

    // ─── Cycles ─────────────────────────────────────────────────

    /// Find every elementary import cycle.
    ///
    /// Strongly-connected components come from petgraph's iterative Tarjan;
    /// cycles inside each component are enumerated with an explicit stack,
    /// so deep chains cannot blow the call stack. Each cycle is reported
    /// once, starting and ending at its lexically smallest member.
    pub fn detect_circular_dependencies(&self) -> Vec<Vec<String>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut index_of: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        for id in self.files.keys() {
            index_of.insert(id.as_str(), graph.add_node(id.as_str()));
        }

        let mut edge_pairs: BTreeSet<(NodeIndex, NodeIndex)> = BTreeSet::new();
        for (id, file) in &self.files {
            for import in &file.imports {
                if let Some(target) = self.resolve_import(id, &import.raw_specifier) {
                    if let (Some(&s), Some(&t)) =
                        (index_of.get(id.as_str()), index_of.get(target.as_str()))
                    {
                        edge_pairs.insert((s, t));
                    }
                }
            }
        }
        for &(s, t) in &edge_pairs {
            graph.add_edge(s, t, ());
        }

        let mut components = tarjan_scc(&graph);
        // Deterministic output: components ordered by their smallest file id.
        for component in &mut components {
            component.sort_by_key(|&n| graph[n]);
        }
        components.sort_by_key(|c| graph[c[0]]);

        let mut cycles = Vec::new();
        for component in components {
            if component.len() == 1 {
                let node = component[0];
                if graph.contains_edge(node, node) {
                    cycles.push(vec![graph[node].to_string(), graph[node].to_string()]);
                }
                continue;
            }
            enumerate_cycles(&graph, &component, &mut cycles);
        }
        cycles
    }

    // ─── Dead Code ──────────────────────────────────────────────

    /// Files with no inbound imports and functions never called, excluding
    /// entry points. Dynamic and reflective invocation is invisible here;
    /// false positives on such code are an accepted limitation.
    pub fn find_dead_code(&self, entry_points: &[String]) -> DeadCode {
        let explicit: HashSet<&str> = entry_points.iter().map(String::as_str).collect();
        let is_entry = |id: &str| {
            if explicit.contains(id) {
                return true;
            }
            let basename = id.rsplit('/').next().unwrap_or(id);
            DEFAULT_ENTRY_FILES.contains(&basename)
        };

        let file_graph = self.build_file_graph();
        let files = file_graph
            .nodes
            .iter()
            .filter(|(id, stats)| stats.in_degree == 0 && !is_entry(id))
            .map(|(id, _)| id.clone())
            .collect();

        let function_graph = self.build_function_graph();
        let called: HashSet<&str> = function_graph
            .edges
            .iter()
            .map(|e| e.callee.as_str())
            .collect();
        let functions = function_graph
            .nodes
            .iter()
            .filter(|(key, node)| !called.contains(key.as_str()) && !is_entry(&node.file_id))
            .map(|(key, _)| key.clone())
            .collect();

        DeadCode { files, functions }
    }

    // ─── Per-File View ──────────────────────────────────────────

    /// Resolved dependencies of one file, both directions. External and
    /// unresolved imports are excluded from this view.
    pub fn file_dependencies(&self, file_id: &str) -> FileDependencies {
        let mut deps = FileDependencies::default();
        for (id, file) in &self.files {
            for import in &file.imports {
                let Some(target) = self.resolve_import(id, &import.raw_specifier) else {
                    continue;
                };
                if id == file_id && !deps.imports.contains(&target) {
                    deps.imports.push(target.clone());
                }
                if target == file_id && !deps.imported_by.contains(id) {
                    deps.imported_by.push(id.clone());
                }
            }
        }
        deps
    }
}

/// Collapse `.` and `..` segments; `None` when `..` escapes the root.
fn normalize_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Interpret a bare specifier as a root-relative module path: `pkg.mod`
/// and `crate::graph::alias` become slash paths, slashed specifiers pass
/// through. Absolute filesystem paths are not project-internal.
fn module_path(raw: &str) -> Option<String> {
    if raw.is_empty() || raw.starts_with('/') || raw.contains(char::is_whitespace) {
        return None;
    }
    let path = if raw.contains("::") {
        raw.replace("::", "/")
    } else if raw.contains('/') {
        raw.to_string()
    } else {
        raw.replace('.', "/")
    };
    normalize_path(&path)
}

/// Enumerate the elementary cycles of one strongly-connected component.
///
/// For each start node (ascending rank) an explicit-stack DFS explores only
/// component members of rank >= start, recording paths that close back on
/// the start. Every elementary cycle is emitted exactly once, anchored at
/// its smallest member.
fn enumerate_cycles(
    graph: &DiGraph<&str, ()>,
    component: &[NodeIndex],
    cycles: &mut Vec<Vec<String>>,
) {
    let rank_of: HashMap<NodeIndex, usize> =
        component.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    // Neighbor lists restricted to the component, sorted for determinism.
    let neighbors: HashMap<NodeIndex, Vec<NodeIndex>> = component
        .iter()
        .map(|&n| {
            let mut targets: Vec<NodeIndex> = graph
                .neighbors(n)
                .filter(|t| rank_of.contains_key(t))
                .collect();
            targets.sort_by_key(|&t| graph[t]);
            targets.dedup();
            (n, targets)
        })
        .collect();

    for (start_rank, &start) in component.iter().enumerate() {
        let mut path: Vec<NodeIndex> = vec![start];
        let mut on_path: HashSet<NodeIndex> = HashSet::from([start]);
        let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let cursor = frame.1;
            frame.1 += 1;

            let node_neighbors = &neighbors[&node];
            if cursor < node_neighbors.len() {
                let next = node_neighbors[cursor];
                if next == start {
                    let mut cycle: Vec<String> =
                        path.iter().map(|&n| graph[n].to_string()).collect();
                    cycle.push(graph[start].to_string());
                    cycles.push(cycle);
                } else if rank_of[&next] > start_rank && !on_path.contains(&next) {
                    on_path.insert(next);
                    path.push(next);
                    stack.push((next, 0));
                }
            } else {
                stack.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(&done);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ImportKind, ImportStatement, Language, SourceFile};

    fn file_with_imports(id: &str, specifiers: &[&str]) -> SourceFile {
        let mut file = SourceFile::empty(id, Language::from_file_id(id), 100, 10, true);
        file.imports = specifiers
            .iter()
            .map(|raw| ImportStatement {
                raw_specifier: raw.to_string(),
                kind: if raw.starts_with('.') {
                    ImportKind::Relative
                } else {
                    ImportKind::Absolute
                },
                imported_items: Vec::new(),
            })
            .collect();
        file
    }

    fn analyzer_with(files: Vec<SourceFile>) -> DependencyAnalyzer {
        let mut analyzer = DependencyAnalyzer::new(AliasTable::default());
        for file in files {
            analyzer.add_file(file);
        }
        analyzer
    }

    #[test]
    fn test_add_file_is_upsert() {
        let mut analyzer = analyzer_with(vec![file_with_imports("a.py", &["b"])]);
        assert_eq!(analyzer.file_count(), 1);

        // Re-adding the same id replaces, never duplicates.
        let mut replacement = file_with_imports("a.py", &[]);
        replacement.line_count = 99;
        analyzer.add_file(replacement);

        assert_eq!(analyzer.file_count(), 1);
        assert_eq!(analyzer.file("a.py").unwrap().line_count, 99);
        assert!(analyzer.file("a.py").unwrap().imports.is_empty());
    }

    #[test]
    fn test_two_file_scenario() {
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &[]),
        ]);
        let graph = analyzer.build_file_graph();

        let a = &graph.nodes["a.py"];
        assert_eq!((a.in_degree, a.out_degree), (0, 1));
        assert_eq!(a.centrality, 0.0);

        let b = &graph.nodes["b.py"];
        assert_eq!((b.in_degree, b.out_degree), (1, 0));
        assert_eq!(b.centrality, 1.0);

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source_id, "a.py");
        assert_eq!(graph.edges[0].target_id.as_deref(), Some("b.py"));
    }

    #[test]
    fn test_centrality_of_hub() {
        let analyzer = analyzer_with(vec![
            file_with_imports("core.py", &[]),
            file_with_imports("u1.py", &["core"]),
            file_with_imports("u2.py", &["core"]),
            file_with_imports("u3.py", &["core"]),
        ]);
        let graph = analyzer.build_file_graph();

        assert_eq!(graph.nodes["core.py"].centrality, 1.0);
        for id in ["u1.py", "u2.py", "u3.py"] {
            assert_eq!(graph.nodes[id].centrality, 0.0);
        }
        assert!(graph.nodes.values().all(|n| (0.0..=1.0).contains(&n.centrality)));
    }

    #[test]
    fn test_duplicate_imports_do_not_inflate_centrality() {
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b", "b"]),
            file_with_imports("b.py", &[]),
        ]);
        let graph = analyzer.build_file_graph();
        assert_eq!(graph.nodes["b.py"].in_degree, 1);
        assert_eq!(graph.nodes["b.py"].centrality, 1.0);
        // Both statements remain visible as raw edges.
        assert_eq!(graph.edges.len(), 2);
    }

    #[test]
    fn test_external_import_has_no_target() {
        let analyzer = analyzer_with(vec![file_with_imports("a.py", &["os", "requests"])]);
        let graph = analyzer.build_file_graph();
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.edges.iter().all(|e| e.target_id.is_none()));
        assert_eq!(graph.nodes["a.py"].out_degree, 0);
    }

    #[test]
    fn test_resolve_relative_path_style() {
        let analyzer = analyzer_with(vec![
            file_with_imports("src/app.js", &["./utils/helper", "../shared/api"]),
            file_with_imports("src/utils/helper.js", &[]),
            file_with_imports("shared/api.ts", &[]),
        ]);

        assert_eq!(
            analyzer.resolve_import("src/app.js", "./utils/helper"),
            Some("src/utils/helper.js".to_string())
        );
        assert_eq!(
            analyzer.resolve_import("src/app.js", "../shared/api"),
            Some("shared/api.ts".to_string())
        );
        // Escaping above the project root is unresolvable, not a panic.
        assert_eq!(analyzer.resolve_import("src/app.js", "../../../x"), None);
    }

    #[test]
    fn test_resolve_relative_dotted_style() {
        let analyzer = analyzer_with(vec![
            file_with_imports("pkg/mod.py", &[".sibling", "..top"]),
            file_with_imports("pkg/sibling.py", &[]),
            file_with_imports("top.py", &[]),
        ]);

        assert_eq!(
            analyzer.resolve_import("pkg/mod.py", ".sibling"),
            Some("pkg/sibling.py".to_string())
        );
        assert_eq!(
            analyzer.resolve_import("pkg/mod.py", "..top"),
            Some("top.py".to_string())
        );
    }

    #[test]
    fn test_resolve_dotted_module_path_from_root() {
        let analyzer = analyzer_with(vec![
            file_with_imports("main.py", &["server.routes.api"]),
            file_with_imports("server/routes/api.py", &[]),
        ]);
        assert_eq!(
            analyzer.resolve_import("main.py", "server.routes.api"),
            Some("server/routes/api.py".to_string())
        );
    }

    #[test]
    fn test_resolve_index_candidates() {
        let analyzer = analyzer_with(vec![
            file_with_imports("src/app.ts", &["./components"]),
            file_with_imports("src/components/index.ts", &[]),
        ]);
        assert_eq!(
            analyzer.resolve_import("src/app.ts", "./components"),
            Some("src/components/index.ts".to_string())
        );
    }

    #[test]
    fn test_resolve_alias() {
        let aliases = AliasTable::from_pairs([("@/*", "src/*")]);
        let mut analyzer = DependencyAnalyzer::new(aliases);
        analyzer.add_file(file_with_imports("src/app.ts", &["@/utils/helper"]));
        analyzer.add_file(file_with_imports("src/utils/helper.ts", &[]));

        assert_eq!(
            analyzer.resolve_import("src/app.ts", "@/utils/helper"),
            Some("src/utils/helper.ts".to_string())
        );

        let graph = analyzer.build_file_graph();
        assert_eq!(
            graph.edges[0].target_id.as_deref(),
            Some("src/utils/helper.ts")
        );
    }

    #[test]
    fn test_resolution_is_pure() {
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &[]),
        ]);
        let first = analyzer.resolve_import("a.py", "b");
        for _ in 0..10 {
            assert_eq!(analyzer.resolve_import("a.py", "b"), first);
        }
    }

    #[test]
    fn test_candidate_order_is_deterministic() {
        // Both b.py and b.rs exist; the extension ladder decides, always
        // the same way.
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &[]),
            file_with_imports("b.rs", &[]),
        ]);
        assert_eq!(analyzer.resolve_import("a.py", "b"), Some("b.py".to_string()));
    }

    #[test]
    fn test_cycle_detection_triangle() {
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &["c"]),
            file_with_imports("c.py", &["a"]),
        ]);
        let cycles = analyzer.detect_circular_dependencies();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["a.py", "b.py", "c.py", "a.py"]);
    }

    #[test]
    fn test_cycle_detection_acyclic() {
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &["c"]),
            file_with_imports("c.py", &[]),
        ]);
        assert!(analyzer.detect_circular_dependencies().is_empty());
    }

    #[test]
    fn test_cycle_detection_reports_all_cycles() {
        // Two distinct elementary cycles through a shared component:
        // a -> b -> a and a -> c -> a.
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b", "c"]),
            file_with_imports("b.py", &["a"]),
            file_with_imports("c.py", &["a"]),
        ]);
        let cycles = analyzer.detect_circular_dependencies();
        assert_eq!(cycles.len(), 2);
        assert!(cycles.contains(&vec![
            "a.py".to_string(),
            "b.py".to_string(),
            "a.py".to_string()
        ]));
        assert!(cycles.contains(&vec![
            "a.py".to_string(),
            "c.py".to_string(),
            "a.py".to_string()
        ]));
    }

    #[test]
    fn test_cycle_detection_two_components() {
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &["a"]),
            file_with_imports("x.py", &["y"]),
            file_with_imports("y.py", &["x"]),
        ]);
        let cycles = analyzer.detect_circular_dependencies();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0][0], "a.py");
        assert_eq!(cycles[1][0], "x.py");
    }

    #[test]
    fn test_dead_code_files() {
        let mut analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &[]),
            file_with_imports("c.py", &[]),
        ]);
        let entries = vec!["a.py".to_string()];

        let dead = analyzer.find_dead_code(&entries);
        assert_eq!(dead.files, vec!["c.py"]);

        // A new inbound edge resurrects c.
        analyzer.add_file(file_with_imports("b.py", &["c"]));
        let dead = analyzer.find_dead_code(&entries);
        assert!(dead.files.is_empty());
    }

    #[test]
    fn test_dead_code_respects_default_entry_names() {
        let analyzer = analyzer_with(vec![
            file_with_imports("main.py", &[]),
            file_with_imports("orphan.py", &[]),
        ]);
        let dead = analyzer.find_dead_code(&[]);
        assert_eq!(dead.files, vec!["orphan.py"]);
    }

    #[test]
    fn test_function_graph_unambiguous_only() {
        use crate::parser::Function;

        let mut helper = file_with_imports("helper.py", &[]);
        helper.functions = vec![Function::new("unique_fn", 1, 3), Function::new("dup", 5, 7)];

        let mut other = file_with_imports("other.py", &[]);
        other.functions = vec![Function::new("dup", 1, 3)];

        let mut caller = file_with_imports("caller.py", &[]);
        let mut run = Function::new("run", 1, 5);
        run.calls = vec!["unique_fn".to_string(), "dup".to_string(), "missing".to_string()];
        caller.functions = vec![run];

        let analyzer = analyzer_with(vec![helper, other, caller]);
        let graph = analyzer.build_function_graph();

        assert_eq!(graph.nodes.len(), 4);
        // Only the unambiguous callee produced an edge.
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].caller, "caller.py#run");
        assert_eq!(graph.edges[0].callee, "helper.py#unique_fn");
    }

    #[test]
    fn test_function_graph_method_nodes() {
        use crate::parser::{Class, Function};

        let mut file = file_with_imports("svc.py", &[]);
        let mut class = Class::new("Service", 1, 20);
        class.methods = vec![Function::new("handle", 2, 10)];
        file.classes = vec![class];

        let analyzer = analyzer_with(vec![file]);
        let graph = analyzer.build_function_graph();
        assert!(graph.nodes.contains_key("svc.py#Service.handle"));
        assert_eq!(graph.nodes["svc.py#Service.handle"].name, "Service.handle");
    }

    #[test]
    fn test_dead_functions() {
        use crate::parser::Function;

        let mut lib = file_with_imports("lib.py", &[]);
        lib.functions = vec![Function::new("used", 1, 2), Function::new("unused", 4, 5)];

        let mut main = file_with_imports("main.py", &[]);
        let mut entry = Function::new("entry", 1, 3);
        entry.calls = vec!["used".to_string()];
        main.functions = vec![entry];

        let analyzer = analyzer_with(vec![lib, main]);
        let dead = analyzer.find_dead_code(&[]);

        assert!(dead.functions.contains(&"lib.py#unused".to_string()));
        assert!(!dead.functions.contains(&"lib.py#used".to_string()));
        // main.py is a default entry file; its functions are exempt.
        assert!(!dead.functions.contains(&"main.py#entry".to_string()));
    }

    #[test]
    fn test_file_dependencies_resolved_only() {
        let analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b", "os"]),
            file_with_imports("b.py", &[]),
            file_with_imports("c.py", &["a"]),
        ]);
        let deps = analyzer.file_dependencies("a.py");
        assert_eq!(deps.imports, vec!["b.py"]);
        assert_eq!(deps.imported_by, vec!["c.py"]);
    }

    #[test]
    fn test_every_listed_file_is_a_node_once() {
        let mut analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &[]),
        ]);
        // Repeated add_file of the same ids.
        analyzer.add_file(file_with_imports("a.py", &["b"]));
        analyzer.add_file(file_with_imports("b.py", &[]));

        let graph = analyzer.build_file_graph();
        assert_eq!(graph.nodes.len(), 2);
        for edge in &graph.edges {
            assert!(graph.nodes.contains_key(&edge.source_id));
            if let Some(target) = &edge.target_id {
                assert!(graph.nodes.contains_key(target));
            }
        }
    }

    #[test]
    fn test_remove_file() {
        let mut analyzer = analyzer_with(vec![
            file_with_imports("a.py", &["b"]),
            file_with_imports("b.py", &[]),
        ]);
        assert!(analyzer.remove_file("b.py"));
        assert!(!analyzer.remove_file("b.py"));

        let graph = analyzer.build_file_graph();
        assert_eq!(graph.nodes.len(), 1);
        // The import is now unresolved, not dangling.
        assert!(graph.edges[0].target_id.is_none());
    }
}
