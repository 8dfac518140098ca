use common::{
    engine::{Engine, Invocation, JobPaths, ScratchIsolation},
    sweep::SweepPoint,
};
use serde::{Deserialize, Serialize};

/// Runs the workload generator directly under the `wasmtime` CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Wasmtime {
    pub program: String,
    /// Workload binary inside the programs dir
    pub binary: String,
    pub extra_args: Vec<String>,
}

impl Default for Wasmtime {
    fn default() -> Self {
        Self {
            program: "wasmtime".to_owned(),
            binary: "veracruz-vfs-bench.wasm".to_owned(),
            extra_args: Vec::new(),
        }
    }
}

#[typetag::serde(name = "wasmtime")]
impl Engine for Wasmtime {
    fn name(&self) -> &'static str {
        "wasmtime"
    }

    fn scratch(&self) -> ScratchIsolation {
        ScratchIsolation::PerJob
    }

    fn invocation(&self, point: &SweepPoint, paths: &JobPaths) -> Invocation {
        Invocation::new(&self.program)
            .arg("--mapdir")
            .arg(format!("/scratch::{}", paths.scratch.display()))
            .arg("--mapdir")
            .arg(format!("/results::{}", paths.results.display()))
            .args(&self.extra_args)
            .arg(paths.programs.join(&self.binary).display())
            .arg(point.mode)
            .arg(point.size)
            .arg(point.block_size)
            .arg(point.run)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn invocation_template() {
        let point = SweepPoint {
            mode: "write_inorder".parse().unwrap(),
            size: 1024,
            block_size: 64,
            run: 0,
        };
        let paths = JobPaths {
            programs: PathBuf::from("programs"),
            scratch: PathBuf::from("scratch/bench-write_inorder-1024-64-0"),
            results: PathBuf::from("results"),
        };
        let invocation = Wasmtime::default().invocation(&point, &paths);
        assert_eq!(
            invocation.args,
            vec![
                "--mapdir",
                "/scratch::scratch/bench-write_inorder-1024-64-0",
                "--mapdir",
                "/results::results",
                "programs/veracruz-vfs-bench.wasm",
                "write_inorder",
                "1024",
                "64",
                "0",
            ]
        );
    }
}
