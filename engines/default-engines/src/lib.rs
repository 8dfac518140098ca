use common::engine::Engine;
pub use vc_fee::VcFee;
pub use wasmtime_runner::Wasmtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    VcFee,
    Wasmtime,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::VcFee, EngineKind::Wasmtime];

    pub fn default_engine(&self) -> Box<dyn Engine> {
        match self {
            EngineKind::VcFee => Box::new(VcFee::default()),
            EngineKind::Wasmtime => Box::new(Wasmtime::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.default_engine().name()
    }
}

/// Touches every engine so their registrations are linked into the binary
pub fn init_engines() {
    for kind in EngineKind::ALL {
        _ = serde_json::to_string(&kind.default_engine());
    }
}
