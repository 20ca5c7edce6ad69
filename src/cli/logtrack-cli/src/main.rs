//! Logtrack CLI - Command line interface.

use std::io::{self, BufRead, Read, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use logtrack_crypto::{aead, hash, kdf, random, HashAlgorithm, PasswordHasher, SymmetricKey};
use logtrack_tokens::{Algorithm, Claims, TokenConfig, TokenManager};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "logtrack")]
#[command(about = "Logtrack CLI - Hashing, encryption, passwords and signed tokens")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a message digest
    Hash {
        /// Algorithm (md5, sha1, sha256, sha512)
        algorithm: String,
        /// Input (read from stdin if not provided)
        input: Option<String>,
        /// Compare against this hex digest instead of printing
        #[arg(long)]
        verify: Option<String>,
    },
    /// Compute an HMAC
    Hmac {
        /// Algorithm (md5, sha1, sha256, sha512)
        algorithm: String,
        /// HMAC key
        #[arg(long, env = "LOGTRACK_HMAC_KEY", hide_env_values = true)]
        key: String,
        /// Input (read from stdin if not provided)
        input: Option<String>,
        /// Compare against this hex HMAC instead of printing
        #[arg(long)]
        verify: Option<String>,
    },
    /// Generate random values
    Random {
        #[command(subcommand)]
        command: RandomCommands,
    },
    /// Password hashing
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },
    /// Symmetric key management
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
    /// Encrypt with AES-256-GCM (output is base64)
    Encrypt {
        /// Base64 encoded 256-bit key
        #[arg(long, env = "LOGTRACK_KEY", hide_env_values = true)]
        key: String,
        /// Plaintext (read from stdin if not provided)
        plaintext: Option<String>,
    },
    /// Decrypt base64 AES-256-GCM ciphertext
    Decrypt {
        /// Base64 encoded 256-bit key
        #[arg(long, env = "LOGTRACK_KEY", hide_env_values = true)]
        key: String,
        /// Base64 ciphertext
        ciphertext: String,
    },
    /// Signed claims tokens
    Token {
        #[command(flatten)]
        signing: TokenArgs,
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
enum RandomCommands {
    /// Random bytes (base64)
    Bytes {
        #[arg(long, default_value = "32")]
        length: usize,
    },
    /// Random alphanumeric string
    #[command(name = "string")]
    Alphanumeric {
        #[arg(long, default_value = "32")]
        length: usize,
    },
    /// Random hex string of exactly `length` characters
    Hex {
        #[arg(long, default_value = "32")]
        length: usize,
    },
    /// Random salt (hex)
    Salt {
        #[arg(long, default_value = "16")]
        length: usize,
    },
    /// Random token (hex, twice `length` characters)
    Token {
        #[arg(long, default_value = "32")]
        length: usize,
    },
}

#[derive(Subcommand)]
enum PasswordCommands {
    /// Hash a password
    Hash {
        /// Password (prompted if not provided)
        password: Option<String>,
    },
    /// Verify a password against a hash
    Verify {
        /// Encoded password hash
        hash: String,
        /// Password (prompted if not provided)
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Generate a random key (base64)
    Generate,
    /// Derive a key from a password with PBKDF2-HMAC-SHA256
    Derive {
        /// Password
        #[arg(long, env = "LOGTRACK_KDF_PASSWORD", hide_env_values = true)]
        password: String,
        /// Salt
        #[arg(long)]
        salt: String,
        /// Iteration count
        #[arg(long, default_value_t = kdf::DEFAULT_PBKDF2_ITERATIONS)]
        iterations: u32,
    },
}

#[derive(clap::Args)]
struct TokenArgs {
    /// Signing secret
    #[arg(long, env = "LOGTRACK_TOKEN_SECRET", hide_env_values = true)]
    secret: String,

    /// Token issuer
    #[arg(long, default_value = "logtrack", env = "LOGTRACK_TOKEN_ISSUER")]
    issuer: String,

    /// Signing algorithm (HS256, HS384, HS512)
    #[arg(long, default_value = "HS256")]
    algorithm: String,
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Issue a token
    Issue {
        /// Subject (user ID)
        #[arg(long)]
        subject: String,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
        /// Email address
        #[arg(long, default_value = "")]
        email: String,
        /// Role (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Custom key=value field (repeatable)
        #[arg(long = "custom")]
        custom: Vec<String>,
        /// Lifetime in seconds
        #[arg(long, default_value = "3600")]
        ttl: u64,
    },
    /// Validate a token and print its claims
    Validate {
        /// Token
        token: String,
    },
    /// Reissue a valid token with a fresh lifetime
    Refresh {
        /// Token
        token: String,
        /// Lifetime in seconds
        #[arg(long, default_value = "3600")]
        ttl: u64,
    },
    /// Check whether a token carries any of the given roles
    HasRole {
        /// Token
        token: String,
        /// Roles (any-of)
        #[arg(required = true)]
        roles: Vec<String>,
    },
}

// ============================================================================
// Input Helpers
// ============================================================================

fn read_input(arg: Option<String>) -> Result<Vec<u8>> {
    match arg {
        Some(value) => Ok(value.into_bytes()),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        },
    }
}

fn prompt_password(arg: Option<String>) -> Result<String> {
    let password = match arg {
        Some(p) => p,
        None => {
            eprint!("Password: ");
            io::stderr().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        },
    };

    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    Ok(password)
}

fn parse_custom(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            _ => bail!("Invalid key=value pair: {}. Use format: key=value", pair),
        })
        .collect()
}

fn verdict(out: &mut impl Write, valid: bool) -> Result<bool> {
    writeln!(out, "{}", if valid { "valid" } else { "invalid" })?;
    Ok(valid)
}

fn token_manager(args: &TokenArgs) -> Result<TokenManager> {
    let algorithm: Algorithm = args
        .algorithm
        .parse()
        .with_context(|| format!("Unknown algorithm: {}", args.algorithm))?;

    let mut config = TokenConfig::new(args.secret.clone(), args.issuer.clone());
    config.algorithm = algorithm;

    TokenManager::new(config).context("Invalid token configuration")
}

// ============================================================================
// Command Handlers
// ============================================================================
//
// Handlers return `Ok(false)` for a negative verdict; `main` maps it to a
// failing exit status.

fn cmd_hash(
    out: &mut impl Write,
    algorithm: &str,
    data: &[u8],
    verify: Option<&str>,
) -> Result<bool> {
    let algorithm: HashAlgorithm = algorithm.parse()?;

    match verify {
        Some(expected) => verdict(out, hash::verify_hash(data, algorithm, expected)),
        None => {
            writeln!(out, "{}", hash::hash(data, algorithm))?;
            Ok(true)
        },
    }
}

fn cmd_hmac(
    out: &mut impl Write,
    algorithm: &str,
    key: &str,
    data: &[u8],
    verify: Option<&str>,
) -> Result<bool> {
    let algorithm: HashAlgorithm = algorithm.parse()?;

    match verify {
        Some(expected) => {
            let valid = hash::verify_hmac(data, key.as_bytes(), algorithm, expected)?;
            verdict(out, valid)
        },
        None => {
            writeln!(out, "{}", hash::hmac(data, key.as_bytes(), algorithm)?)?;
            Ok(true)
        },
    }
}

fn cmd_random(out: &mut impl Write, command: RandomCommands) -> Result<bool> {
    let output = match command {
        RandomCommands::Bytes { length } => BASE64.encode(random::random_bytes(length)?),
        RandomCommands::Alphanumeric { length } => random::random_string(length)?,
        RandomCommands::Hex { length } => random::random_hex(length)?,
        RandomCommands::Salt { length } => hex::encode(random::generate_salt(length)?),
        RandomCommands::Token { length } => random::secure_token(length)?,
    };

    writeln!(out, "{}", output)?;
    Ok(true)
}

fn cmd_password(out: &mut impl Write, command: PasswordCommands) -> Result<bool> {
    let hasher = PasswordHasher::default();

    match command {
        PasswordCommands::Hash { password } => {
            let password = prompt_password(password)?;
            writeln!(out, "{}", hasher.hash(&password)?)?;
            Ok(true)
        },
        PasswordCommands::Verify { hash, password } => {
            let password = prompt_password(password)?;
            let valid = hasher.verify(&password, &hash)?;
            if valid && hasher.needs_rehash(&hash)? {
                let target = hasher.work_factor();
                tracing::warn!(
                    m_cost = target.memory_kib,
                    t_cost = target.iterations,
                    p_cost = target.parallelism,
                    "Password hash uses outdated parameters; rehash recommended"
                );
            }
            verdict(out, valid)
        },
    }
}

fn cmd_key(out: &mut impl Write, command: KeyCommands) -> Result<bool> {
    let key = match command {
        KeyCommands::Generate => SymmetricKey::generate()?,
        KeyCommands::Derive {
            password,
            salt,
            iterations,
        } => kdf::derive_key_from_password(password.as_bytes(), salt.as_bytes(), iterations)?,
    };

    writeln!(out, "{}", key.to_base64())?;
    Ok(true)
}

fn cmd_encrypt(out: &mut impl Write, key: &str, plaintext: &[u8]) -> Result<bool> {
    let key = SymmetricKey::from_base64(key).context("Invalid key")?;

    let ciphertext = aead::encrypt(&key, plaintext, None)?;
    writeln!(out, "{}", BASE64.encode(ciphertext))?;
    Ok(true)
}

/// Writes the raw plaintext bytes; binary input round-trips unchanged.
fn cmd_decrypt(out: &mut impl Write, key: &str, ciphertext: &str) -> Result<bool> {
    let key = SymmetricKey::from_base64(key).context("Invalid key")?;
    let ciphertext = BASE64
        .decode(ciphertext.trim())
        .context("Ciphertext is not valid base64")?;

    let plaintext = aead::decrypt(&key, &ciphertext, None).context("Decryption failed")?;
    out.write_all(&plaintext)?;
    out.flush()?;
    Ok(true)
}

fn cmd_token(out: &mut impl Write, signing: &TokenArgs, command: TokenCommands) -> Result<bool> {
    let manager = token_manager(signing)?;

    match command {
        TokenCommands::Issue {
            subject,
            name,
            email,
            roles,
            custom,
            ttl,
        } => {
            let mut claims = Claims::new(subject).with_name(name).with_email(email);
            for role in roles {
                claims = claims.with_role(role);
            }
            for (k, v) in parse_custom(&custom)? {
                claims = claims.with_custom(k, v);
            }

            let token = manager.issue(&claims, Duration::from_secs(ttl))?;
            writeln!(out, "{}", token)?;
        },
        TokenCommands::Validate { token } => {
            let claims = manager.validate(&token)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&claims)?)?;
        },
        TokenCommands::Refresh { token, ttl } => {
            let token = manager.refresh(&token, Duration::from_secs(ttl))?;
            writeln!(out, "{}", token)?;
        },
        TokenCommands::HasRole { token, roles } => {
            let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
            return verdict(out, manager.has_any_role(&token, &roles)?);
        },
    }

    Ok(true)
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<ExitCode> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();

    let success = match cli.command {
        Commands::Hash {
            algorithm,
            input,
            verify,
        } => cmd_hash(&mut out, &algorithm, &read_input(input)?, verify.as_deref()),
        Commands::Hmac {
            algorithm,
            key,
            input,
            verify,
        } => cmd_hmac(
            &mut out,
            &algorithm,
            &key,
            &read_input(input)?,
            verify.as_deref(),
        ),
        Commands::Random { command } => cmd_random(&mut out, command),
        Commands::Password { command } => cmd_password(&mut out, command),
        Commands::Key { command } => cmd_key(&mut out, command),
        Commands::Encrypt { key, plaintext } => {
            cmd_encrypt(&mut out, &key, &read_input(plaintext)?)
        },
        Commands::Decrypt { key, ciphertext } => cmd_decrypt(&mut out, &key, &ciphertext),
        Commands::Token { signing, command } => cmd_token(&mut out, &signing, command),
    }?;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
