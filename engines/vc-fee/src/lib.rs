use common::{
    engine::{Engine, Invocation, JobPaths, ScratchIsolation},
    sweep::SweepPoint,
};
use serde::{Deserialize, Serialize};

/// Runs the workload generator inside the `vc-fee` freestanding execution environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VcFee {
    pub program: String,
    /// Execution strategy passed with `-x`
    pub strategy: String,
    /// Workload binary inside the programs dir
    pub binary: String,
}

impl Default for VcFee {
    fn default() -> Self {
        Self {
            program: "vc-fee".to_owned(),
            strategy: "jit".to_owned(),
            binary: "veracruz-vfs-bench.wasm".to_owned(),
        }
    }
}

impl VcFee {
    /// argv[0] the workload sees, the binary name without its extension
    fn argv0(&self) -> &str {
        self.binary
            .rsplit_once('.')
            .map_or(self.binary.as_str(), |(stem, _)| stem)
    }
}

#[typetag::serde(name = "vc-fee")]
impl Engine for VcFee {
    fn name(&self) -> &'static str {
        "vc-fee"
    }

    fn scratch(&self) -> ScratchIsolation {
        // the host maps output dirs by their name, so every job sees the same scratch
        ScratchIsolation::Shared
    }

    fn invocation(&self, point: &SweepPoint, paths: &JobPaths) -> Invocation {
        let mut invocation =
            Invocation::new(&self.program).args(["-de", "-x", self.strategy.as_str()]);
        for arg in [
            self.argv0().to_owned(),
            point.mode.to_string(),
            point.size.to_string(),
            point.block_size.to_string(),
            point.run.to_string(),
        ] {
            invocation = invocation.arg("--arg").arg(arg);
        }
        invocation
            .arg("-p")
            .arg(paths.programs.join(&self.binary).display())
            .arg("-i")
            .arg(paths.programs.display())
            .arg("-o")
            .arg(paths.scratch.display())
            .arg("-o")
            .arg(paths.results.display())
    }
}
