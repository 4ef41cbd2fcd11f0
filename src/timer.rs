use std::time::Duration;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// 8-bit down counter, decremented once per timer tick while nonzero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub count: u8,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self { count: init_count }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    pub fn get(&self) -> u8 {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }

    /// Returns true when this tick took the counter from 1 to 0.
    pub fn tick(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        self.count == 0
    }
}

/// How much work a slice of wall-clock time is worth.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Due {
    pub cycles: u64,
    pub timer_ticks: u64,
}

/// Fixed-step accumulator that splits elapsed time into instruction cycles
/// and timer ticks independently. Leftover time carries into the next call.
#[derive(Debug, Clone)]
pub struct Pacer {
    cycles_per_second: u128,
    timer_hz: u128,
    cycle_acc: u128,
    timer_acc: u128,
}

impl Pacer {
    pub fn new(cycles_per_second: u32, timer_hz: u32) -> Self {
        Self {
            cycles_per_second: cycles_per_second.max(1) as u128,
            timer_hz: timer_hz.max(1) as u128,
            cycle_acc: 0,
            timer_acc: 0,
        }
    }

    pub fn advance(&mut self, elapsed: Duration) -> Due {
        let nanos = elapsed.as_nanos();

        self.cycle_acc += nanos * self.cycles_per_second;
        let cycles = self.cycle_acc / NANOS_PER_SECOND;
        self.cycle_acc %= NANOS_PER_SECOND;

        self.timer_acc += nanos * self.timer_hz;
        let timer_ticks = self.timer_acc / NANOS_PER_SECOND;
        self.timer_acc %= NANOS_PER_SECOND;

        Due {
            cycles: cycles as u64,
            timer_ticks: timer_ticks as u64,
        }
    }

    pub fn reset(&mut self) {
        self.cycle_acc = 0;
        self.timer_acc = 0;
    }
}
