// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP handlers, one module per area of the digitizer page.

pub mod apartments;
pub mod drawing;
pub mod export;
pub mod health;
pub mod sessions;
pub mod view;
