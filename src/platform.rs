use tracing::info;

/// Host environment the game is embedded in
pub trait Platform {
    /// Input is ignored until the host reports ready
    fn is_ready(&self) -> bool;
    /// Hand a result line to the host's share sink
    fn share(&mut self, text: &str);
}

/// Terminal host: ready once the screen is set up; shared lines are printed after exit
#[derive(Debug, Default)]
pub struct TerminalPlatform {
    ready: bool,
    shared: Vec<String>,
}

impl TerminalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn take_shared(&mut self) -> Vec<String> {
        std::mem::take(&mut self.shared)
    }
}

impl Platform for TerminalPlatform {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn share(&mut self, text: &str) {
        info!("shared result: {}", text);
        self.shared.push(text.to_string());
    }
}

/// Always ready, shares nowhere
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPlatform;

impl Platform for HeadlessPlatform {
    fn is_ready(&self) -> bool {
        true
    }

    fn share(&mut self, text: &str) {
        info!("share ignored (headless): {}", text);
    }
}
