//! Graph ejecutable de un job: nodos compilados + relaciones must-precede.
//!
//! El graph es una descripción: no ejecuta nada. El scheduler externo
//! consulta `upstream`/`downstream`/`topological_order` para decidir orden y
//! conduce cada `TaskNode` por su ciclo de vida. La aciclicidad se valida en
//! compilación (`detect_cycle`), así que las consultas de orden no fallan.

use indexmap::IndexMap;

use jobflow_core::TaskNode;

/// Resultado de compilar un `JobSpec`: metadata del job, nodos por task_id y
/// edges válidos (source debe preceder a target).
pub struct TaskGraph {
    pub job_id: String,
    pub description: String,
    pub schedule: String,
    pub catchup: bool,
    pub tags: Vec<String>,
    nodes: IndexMap<String, TaskNode>,
    edges: Vec<(String, String)>,
}

impl TaskGraph {
    pub(crate) fn new(job_id: String,
                      description: String,
                      schedule: String,
                      catchup: bool,
                      tags: Vec<String>,
                      nodes: IndexMap<String, TaskNode>,
                      edges: Vec<(String, String)>)
                      -> Self {
        Self { job_id, description, schedule, catchup, tags, nodes, edges }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn node(&self, task_id: &str) -> Option<&TaskNode> {
        self.nodes.get(task_id)
    }

    /// Acceso mutable para que el scheduler conduzca el ciclo de vida.
    pub fn node_mut(&mut self, task_id: &str) -> Option<&mut TaskNode> {
        self.nodes.get_mut(task_id)
    }

    /// Edges como pares (source, target).
    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    /// Prerequisitos directos de `task_id`.
    pub fn upstream(&self, task_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(_, t)| t == task_id)
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// Tasks que dependen directamente de `task_id`.
    pub fn downstream(&self, task_id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(s, _)| s == task_id)
            .map(|(_, t)| t.as_str())
            .collect()
    }

    /// Orden topológico estable: ante empates gana el orden de declaración.
    /// El graph es acíclico por construcción, así que cubre todos los nodos.
    pub fn topological_order(&self) -> Vec<&str> {
        kahn_order(&self.nodes, &self.edges)
    }
}

// Kahn sobre in-degrees. Devuelve los nodos en orden ejecutable; los que
// queden con in-degree > 0 participan de un ciclo y no aparecen.
fn kahn_order<'a>(nodes: &'a IndexMap<String, TaskNode>, edges: &'a [(String, String)]) -> Vec<&'a str> {
    let mut indegree: IndexMap<&str, usize> = nodes.keys().map(|k| (k.as_str(), 0)).collect();
    for (_, target) in edges {
        if let Some(d) = indegree.get_mut(target.as_str()) {
            *d += 1;
        }
    }
    let mut ready: Vec<&str> = indegree.iter().filter(|(_, d)| **d == 0).map(|(k, _)| *k).collect();
    let mut order = Vec::with_capacity(nodes.len());
    while !ready.is_empty() {
        // FIFO preserva el orden de declaración entre nodos listos
        let current = ready.remove(0);
        order.push(current);
        for (source, target) in edges {
            if source == current {
                if let Some(d) = indegree.get_mut(target.as_str()) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(target.as_str());
                    }
                }
            }
        }
    }
    order
}

/// Detección de ciclos para el compilador: si el orden de Kahn no cubre
/// todos los nodos, los faltantes forman (o cuelgan de) un ciclo. Devuelve
/// sus task_ids en orden de declaración.
pub(crate) fn detect_cycle(nodes: &IndexMap<String, TaskNode>, edges: &[(String, String)]) -> Option<Vec<String>> {
    let order = kahn_order(nodes, edges);
    if order.len() == nodes.len() {
        return None;
    }
    let ordered: std::collections::HashSet<&str> = order.into_iter().collect();
    let cycle: Vec<String> = nodes.keys().filter(|k| !ordered.contains(k.as_str())).cloned().collect();
    Some(cycle)
}
