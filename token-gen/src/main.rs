use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::{Parser, ValueEnum};
use jsonwebtoken::{Algorithm, EncodingKey, Header};

/// Mint an HMAC-signed bearer token for exercising the edge filter locally.
///
/// The secret is read the same way the filter reads `JWT_SECRET_KEY`:
/// base64 by default, or raw bytes with `--secret-encoding raw`.
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Shared HMAC secret
    #[arg(long, env = "JWT_SECRET_KEY")]
    secret: String,

    #[arg(long, value_enum, default_value_t = SecretEncoding::Base64)]
    secret_encoding: SecretEncoding,

    /// Subject (becomes X-User-Id downstream)
    #[arg(long)]
    sub: String,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    role: Option<String>,

    /// Lifetime in seconds. Negative values produce an already expired token.
    #[arg(long, default_value_t = 3600, allow_negative_numbers = true)]
    ttl_seconds: i64,

    #[arg(long, value_enum, default_value_t = HmacAlg::Hs256)]
    alg: HmacAlg,

    /// Print only the token
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SecretEncoding {
    Base64,
    Raw,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HmacAlg {
    Hs256,
    Hs384,
    Hs512,
}

impl From<HmacAlg> for Algorithm {
    fn from(alg: HmacAlg) -> Self {
        match alg {
            HmacAlg::Hs256 => Algorithm::HS256,
            HmacAlg::Hs384 => Algorithm::HS384,
            HmacAlg::Hs512 => Algorithm::HS512,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let secret = match args.secret_encoding {
        SecretEncoding::Base64 => STANDARD.decode(args.secret.trim())?,
        SecretEncoding::Raw => args.secret.into_bytes(),
    };

    let iat = chrono::Utc::now().timestamp();
    let exp = iat + args.ttl_seconds;

    let mut claims = serde_json::Map::new();
    claims.insert("sub".to_string(), serde_json::Value::String(args.sub));
    claims.insert("iat".to_string(), serde_json::Value::Number(iat.into()));
    claims.insert("exp".to_string(), serde_json::Value::Number(exp.into()));
    if let Some(email) = args.email {
        claims.insert("email".to_string(), serde_json::Value::String(email));
    }
    if let Some(role) = args.role {
        claims.insert("role".to_string(), serde_json::Value::String(role));
    }

    let header = Header::new(args.alg.into());
    let token = jsonwebtoken::encode(
        &header,
        &serde_json::Value::Object(claims),
        &EncodingKey::from_secret(&secret),
    )?;

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    println!("token: {}", token);
    println!("alg: {:?}", header.alg);
    println!("iat: {}", iat);
    println!("exp: {}", exp);
    println!("Authorization: Bearer {}", token);

    Ok(())
}
