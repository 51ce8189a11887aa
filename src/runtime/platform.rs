use std::cell::RefCell;

/// Host services the runtime needs. Only line output today; `puts` is the
/// single caller.
pub trait Platform {
    fn write_line(&self, line: &str);
}

/// Writes to the process stdout.
pub struct StdPlatform;

impl Platform for StdPlatform {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}

/// Buffers every line in memory so callers can inspect program output.
#[derive(Default)]
pub struct CapturePlatform {
    lines: RefCell<Vec<String>>,
}

impl CapturePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl Platform for CapturePlatform {
    fn write_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_platform_keeps_lines_in_order() {
        let platform = CapturePlatform::new();
        platform.write_line("first");
        platform.write_line("second");
        assert_eq!(platform.lines(), vec!["first", "second"]);
    }
}
