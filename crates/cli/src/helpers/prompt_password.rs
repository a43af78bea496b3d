// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Password};
use zeroize::Zeroizing;

use super::ensure_hex_zeroizing;

pub fn prompt_private_key() -> Result<Zeroizing<String>> {
    let input = Zeroizing::new(
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Enter your Ethereum private key")
            .validate_with(|input: &String| -> std::result::Result<(), String> {
                ensure_hex_zeroizing(input)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            })
            .interact()?,
    );

    ensure_hex_zeroizing(&input)
}
