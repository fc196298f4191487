// generate_secret.rs
// Utility to generate a new token signing secret

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

const SECRET_BYTES: usize = 48;

fn main() {
    println!("Generating new token signing secret...\n");

    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let secret = URL_SAFE_NO_PAD.encode(bytes);

    println!("✅ Secret generated successfully!\n");
    println!("Add this to your .env file:");
    println!("─────────────────────────────────────────────────");
    println!("SIGNING_SECRET={}", secret);
    println!("─────────────────────────────────────────────────");
    println!("\n⚠️  IMPORTANT:");
    println!("  • Keep this secret secure and never commit it to version control");
    println!("  • Changing it invalidates every access and refresh token already issued");
}
