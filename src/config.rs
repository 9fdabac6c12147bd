pub struct Config {
    pub debug_mode: bool,
    pub debug_row_limit: usize,
}

impl Config {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            debug_row_limit: 10,
        }
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_debug_row_limit(mut self, limit: usize) -> Self {
        self.debug_row_limit = limit;
        self
    }
}
