// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination signals a service's `stop_sequence` escalates through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopSignal {
    #[serde(rename = "SIGINT")]
    Interrupt,
    #[serde(rename = "SIGTERM")]
    Terminate,
    #[serde(rename = "SIGQUIT")]
    Quit,
    #[serde(rename = "SIGHUP")]
    Hangup,
    #[serde(rename = "SIGKILL")]
    Kill,
}

crate::simple_display! {
    StopSignal {
        Interrupt => "SIGINT",
        Terminate => "SIGTERM",
        Quit => "SIGQUIT",
        Hangup => "SIGHUP",
        Kill => "SIGKILL",
    }
}

impl StopSignal {
    /// Sequence used when a service declares none.
    pub fn default_sequence() -> Vec<StopSignal> {
        vec![StopSignal::Terminate, StopSignal::Kill]
    }

    /// `SIGKILL` cannot be handled, so nothing escalates past it.
    pub fn is_final(&self) -> bool {
        matches!(self, StopSignal::Kill)
    }
}
