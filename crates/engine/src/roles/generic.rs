// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::RoleHooks;

/// Services without a known role: templates from their own fields, liveness as health.
pub struct GenericHooks;

impl RoleHooks for GenericHooks {}
