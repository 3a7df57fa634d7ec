use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Console,
    Terminal,
    Debug,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Console, Channel::Terminal, Channel::Debug];

    fn index(self) -> usize {
        match self {
            Self::Console => 0,
            Self::Terminal => 1,
            Self::Debug => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Terminal => "terminal",
            Self::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputEntry {
    pub timestamp: DateTime<Local>,
    pub channel: Channel,
    pub severity: Severity,
    pub text: String,
}

impl OutputEntry {
    /// `[HH:MM:SS] text`, as shown in the console panel and in dumps.
    pub fn display_line(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.text)
    }
}

/// Append-only log partitioned by channel.
///
/// Entries are never edited or reordered; arrival order is completion order.
#[derive(Debug, Default, Clone)]
pub struct OutputSink {
    channels: [Vec<OutputEntry>; 3],
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        channel: Channel,
        severity: Severity,
        text: impl Into<String>,
    ) -> &OutputEntry {
        self.append_at(channel, severity, text, Local::now())
    }

    pub fn append_at(
        &mut self,
        channel: Channel,
        severity: Severity,
        text: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> &OutputEntry {
        let entries = &mut self.channels[channel.index()];
        entries.push(OutputEntry {
            timestamp,
            channel,
            severity,
            text: text.into(),
        });
        let idx = entries.len() - 1;
        &entries[idx]
    }

    pub fn clear(&mut self, channel: Channel) -> bool {
        let entries = &mut self.channels[channel.index()];
        if entries.is_empty() {
            return false;
        }
        entries.clear();
        true
    }

    pub fn entries(&self, channel: Channel) -> &[OutputEntry] {
        &self.channels[channel.index()]
    }

    pub fn len(&self, channel: Channel) -> usize {
        self.channels[channel.index()].len()
    }

    pub fn is_empty(&self, channel: Channel) -> bool {
        self.channels[channel.index()].is_empty()
    }

    pub fn last(&self, channel: Channel) -> Option<&OutputEntry> {
        self.channels[channel.index()].last()
    }

    pub fn total_len(&self) -> usize {
        self.channels.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/output.rs"]
mod tests;
