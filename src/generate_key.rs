// generate_key.rs
// Prints a fresh master key for encrypting provider API keys in system_settings

#[path = "services/encryption.rs"]
#[allow(dead_code)]
mod encryption;

use encryption::EncryptionService;

fn main() {
    println!("Generating new AES-256 encryption key...\n");

    let key = EncryptionService::generate_key();

    println!("✅ Key generated successfully!\n");
    println!("Add this to your .env file:");
    println!("─────────────────────────────────────────────────");
    println!("ENCRYPTION_MASTER_KEY={}", key);
    println!("─────────────────────────────────────────────────");
    println!("\n⚠️  IMPORTANT:");
    println!("  • Settings such as openai_api_key and tavily_api_key are sealed with this key");
    println!("  • Keep it out of version control and store a backup securely");
    println!("  • Rotating or losing it makes stored provider keys unreadable");
}
