//! Fixed-window in-memory rate limiting, keyed by client address.
//!
//! Three windows: a per-minute budget that only the chat endpoints spend,
//! plus hourly and daily budgets spent by every request. Windows reset
//! wholesale when their span elapses; burst-at-the-boundary is accepted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::LimitsConfig;

/// Which budget a request spends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Chat endpoints: per-minute budget plus the global ones.
    Chat,
    /// Everything else: global budgets only.
    General,
}

struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            started: now,
            count: 0,
        }
    }

    fn hit(&mut self, now: Instant, span: Duration, limit: u32) -> bool {
        if now.duration_since(self.started) >= span {
            self.started = now;
            self.count = 0;
        }
        if self.count >= limit {
            return false;
        }
        self.count += 1;
        true
    }
}

struct ClientWindows {
    minute: Window,
    hour: Window,
    day: Window,
}

impl ClientWindows {
    fn new(now: Instant) -> Self {
        Self {
            minute: Window::new(now),
            hour: Window::new(now),
            day: Window::new(now),
        }
    }
}

pub struct RateLimiter {
    chat_per_minute: u32,
    per_hour: u32,
    per_day: u32,
    minute_span: Duration,
    hour_span: Duration,
    day_span: Duration,
    clients: Mutex<HashMap<String, ClientWindows>>,
}

const MAX_TRACKED_CLIENTS: usize = 100_000;

impl RateLimiter {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            chat_per_minute: limits.chat_per_minute,
            per_hour: limits.per_hour,
            per_day: limits.per_day,
            minute_span: Duration::from_secs(60),
            hour_span: Duration::from_secs(3600),
            day_span: Duration::from_secs(86_400),
            clients: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    fn with_spans(mut self, minute: Duration, hour: Duration, day: Duration) -> Self {
        self.minute_span = minute;
        self.hour_span = hour;
        self.day_span = day;
        self
    }

    /// Spend one request from `client`'s budgets. Returns whether the
    /// request is allowed.
    pub fn check(&self, client: &str, scope: Scope) -> bool {
        let now = Instant::now();
        let mut clients = match self.clients.lock() {
            Ok(guard) => guard,
            // A poisoned limiter should not take the service down.
            Err(poisoned) => poisoned.into_inner(),
        };

        if clients.len() >= MAX_TRACKED_CLIENTS && !clients.contains_key(client) {
            let day_span = self.day_span;
            clients.retain(|_, w| now.duration_since(w.day.started) < day_span);
        }

        let windows = clients
            .entry(client.to_string())
            .or_insert_with(|| ClientWindows::new(now));

        if !windows.day.hit(now, self.day_span, self.per_day) {
            return false;
        }
        if !windows.hour.hit(now, self.hour_span, self.per_hour) {
            return false;
        }
        if scope == Scope::Chat && !windows.minute.hit(now, self.minute_span, self.chat_per_minute)
        {
            return false;
        }
        true
    }
}
