use std::collections::HashMap;

/// A precedence graph over job names, stored as forward adjacency.
///
/// Each key is a job name and each value is the ordered list of successor
/// names that consume its output. This forward representation (A -> [B, C])
/// is what the composition compiler emits and what the execution engine
/// routes outputs with; the reverse mapping (a job's predecessors) is derived
/// on demand for fan-in wiring.
///
/// ```
/// use std::collections::HashMap;
/// use jobgraph::graph::DependencyGraph;
///
/// // Diamond: a -> [b, c] -> d
/// let mut adjacency = HashMap::new();
/// adjacency.insert("a".to_string(), vec!["b".to_string(), "c".to_string()]);
/// adjacency.insert("b".to_string(), vec!["d".to_string()]);
/// adjacency.insert("c".to_string(), vec!["d".to_string()]);
/// adjacency.insert("d".to_string(), vec![]);
///
/// let graph = DependencyGraph::from(adjacency);
/// assert_eq!(graph.build_predecessor_counts().get("d"), Some(&2));
/// assert!(graph.topological_sort().is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph(pub HashMap<String, Vec<String>>);

impl DependencyGraph {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Set the ordered successor list for a job.
    pub fn add_successors(&mut self, job: String, successors: Vec<String>) {
        self.0.insert(job, successors);
    }

    pub fn successors(&self, job: &str) -> Option<&Vec<String>> {
        self.0.get(job)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count incoming edges for every job. Jobs with a count of zero are
    /// head candidates.
    pub fn build_predecessor_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();

        for job in self.0.keys() {
            counts.insert(job.clone(), 0);
        }

        for successors in self.0.values() {
            for successor in successors {
                *counts.entry(successor.clone()).or_insert(0) += 1;
            }
        }

        counts
    }

    /// Build the reverse mapping: job -> list of jobs it consumes input from.
    pub fn build_predecessors(&self) -> HashMap<String, Vec<String>> {
        let mut predecessors = HashMap::new();

        for job in self.0.keys() {
            predecessors.insert(job.clone(), vec![]);
        }

        for (job, successors) in &self.0 {
            for successor in successors {
                predecessors
                    .entry(successor.clone())
                    .or_insert_with(Vec::new)
                    .push(job.clone());
            }
        }

        predecessors
    }

    /// Topological order via Kahn's algorithm, or `None` if the graph has a
    /// cycle.
    pub fn topological_sort(&self) -> Option<Vec<String>> {
        let mut counts = self.build_predecessor_counts();
        let mut queue: Vec<String> = counts
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(job, _)| job.clone())
            .collect();
        let mut order = Vec::with_capacity(self.0.len());

        while let Some(job) = queue.pop() {
            if let Some(successors) = self.0.get(&job) {
                for successor in successors {
                    if let Some(count) = counts.get_mut(successor) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push(successor.clone());
                        }
                    }
                }
            }
            order.push(job);
        }

        if order.len() == self.0.len() {
            Some(order)
        } else {
            None
        }
    }

    /// Locate one cycle and return its path, or `None` if the graph is
    /// acyclic. DFS with a gray/black coloring; the returned path starts and
    /// ends on the same job.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        const UNVISITED: u8 = 0;
        const VISITING: u8 = 1;
        const VISITED: u8 = 2;

        let mut state: HashMap<&str, u8> = HashMap::new();
        let mut stack: Vec<String> = Vec::new();

        fn dfs<'a>(
            graph: &'a HashMap<String, Vec<String>>,
            node: &'a str,
            state: &mut HashMap<&'a str, u8>,
            stack: &mut Vec<String>,
        ) -> Option<Vec<String>> {
            state.insert(node, VISITING);
            stack.push(node.to_string());

            if let Some(successors) = graph.get(node) {
                for successor in successors {
                    match state.get(successor.as_str()).copied().unwrap_or(UNVISITED) {
                        VISITING => {
                            // back edge; slice the stack from the repeat point
                            let start = stack
                                .iter()
                                .position(|j| j == successor)
                                .unwrap_or(0);
                            let mut cycle = stack[start..].to_vec();
                            cycle.push(successor.clone());
                            return Some(cycle);
                        }
                        VISITED => {}
                        _ => {
                            if let Some(cycle) = dfs(graph, successor, state, stack) {
                                return Some(cycle);
                            }
                        }
                    }
                }
            }

            state.insert(node, VISITED);
            stack.pop();
            None
        }

        for node in self.0.keys() {
            if state.get(node.as_str()).copied().unwrap_or(UNVISITED) == UNVISITED {
                if let Some(cycle) = dfs(&self.0, node, &mut state, &mut stack) {
                    return Some(cycle);
                }
            }
        }

        None
    }
}

impl From<HashMap<String, Vec<String>>> for DependencyGraph {
    fn from(adjacency: HashMap<String, Vec<String>>) -> Self {
        Self(adjacency)
    }
}

impl From<DependencyGraph> for HashMap<String, Vec<String>> {
    fn from(graph: DependencyGraph) -> Self {
        graph.0
    }
}
