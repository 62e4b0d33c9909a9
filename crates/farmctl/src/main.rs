use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use farm_services::config::BackendConfig;
use farm_services::{
    chat, crops, documents, locations, market, users, weather, Advisor, AlertType, Backend,
    BackendSelector, ChatMessage, Coordinates, EntityKind, FarmLocationUpdate, NewCropRecord,
    NewFarmLocation, NewMarketPrice, NewPriceAlert, NewWeatherAlert, Payload, PriceDirection,
    Query, Sender, UserProfileUpdate,
};
use farm_services::advisor::Topic;

#[derive(Debug, Parser)]
#[command(name = "farmctl")]
#[command(about = "Manage farm dashboard data from the command line")]
struct Cli {
    /// Use the mock backend even when configuration is complete
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show which backend is in use
    Status,
    /// Create an account
    Signup(Credentials),
    /// Check an email/password pair
    Signin(Credentials),
    /// User profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Farm locations
    #[command(subcommand)]
    Locations(LocationCommand),
    /// Crop records
    #[command(subcommand)]
    Crops(CropCommand),
    /// Weather alerts
    #[command(subcommand)]
    Alerts(AlertCommand),
    /// Market prices and price alerts
    #[command(subcommand)]
    Market(MarketCommand),
    /// Advisor chat
    #[command(subcommand)]
    Chat(ChatCommand),
    /// Print any document as JSON
    Get {
        /// Collection name, e.g. farmLocations
        collection: EntityKind,
        id: String,
    },
}

#[derive(Debug, Args)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Debug, Args)]
struct Owner {
    /// Owning user id
    #[arg(long)]
    user: String,
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    Show(Owner),
    Set {
        #[command(flatten)]
        owner: Owner,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        farm_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum LocationCommand {
    List(Owner),
    Add {
        #[command(flatten)]
        owner: Owner,
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        /// Area in acres
        #[arg(long)]
        area: f64,
        #[arg(long)]
        crop: String,
        #[arg(long)]
        soil: String,
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
    },
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        crop: Option<String>,
        #[arg(long)]
        area: Option<f64>,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
enum CropCommand {
    List(Owner),
    Add {
        #[command(flatten)]
        owner: Owner,
        #[arg(long)]
        crop: String,
        #[arg(long)]
        field: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Photo to upload with the record
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlertKind {
    Warning,
    Info,
    Severe,
}

impl From<AlertKind> for AlertType {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Warning => AlertType::Warning,
            AlertKind::Info => AlertType::Info,
            AlertKind::Severe => AlertType::Severe,
        }
    }
}

#[derive(Debug, Subcommand)]
enum AlertCommand {
    List(Owner),
    Add {
        #[command(flatten)]
        owner: Owner,
        #[arg(long, value_enum, default_value_t = AlertKind::Info)]
        kind: AlertKind,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        time: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    Above,
    Below,
}

impl From<Side> for PriceDirection {
    fn from(side: Side) -> Self {
        match side {
            Side::Above => PriceDirection::Above,
            Side::Below => PriceDirection::Below,
        }
    }
}

#[derive(Debug, Subcommand)]
enum MarketCommand {
    /// Latest quotes
    Prices {
        /// Region to show, or "all"
        #[arg(long)]
        region: Option<String>,
    },
    /// Record a quote
    Quote {
        #[arg(long)]
        crop: String,
        #[arg(long)]
        current: f64,
        #[arg(long)]
        previous: f64,
        #[arg(long, default_value = "per quintal")]
        unit: String,
        #[arg(long)]
        market: String,
        #[arg(long)]
        region: Option<String>,
    },
    /// The user's price alerts, with those met by current prices marked
    Alerts(Owner),
    /// Add a price alert
    Alert {
        #[command(flatten)]
        owner: Owner,
        #[arg(long)]
        crop: String,
        #[arg(long)]
        target: f64,
        #[arg(long, value_enum)]
        direction: Side,
    },
}

#[derive(Debug, Subcommand)]
enum ChatCommand {
    History(Owner),
    /// Ask the advisor a question
    Send {
        #[command(flatten)]
        owner: Owner,
        #[arg(long)]
        message: String,
    },
    /// Print messages as they arrive until interrupted
    Watch(Owner),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = if cli.mock {
        BackendConfig::default()
    } else {
        BackendConfig::from_env()
    };

    let selector = BackendSelector::new();
    let backend = selector.init(&config).await;

    match cli.command {
        Command::Status => status(backend, &config).await?,
        Command::Signup(creds) => {
            let user = backend.auth().sign_up(&creds.email, &creds.password).await?;
            println!("Created account {} ({})", user.uid, user.email);
        }
        Command::Signin(creds) => {
            let user = backend.auth().sign_in(&creds.email, &creds.password).await?;
            println!(
                "Signed in as {} ({})",
                user.display_name.as_deref().unwrap_or(&user.email),
                user.uid
            );
        }
        Command::Profile(cmd) => profile(backend, cmd).await?,
        Command::Locations(cmd) => farm_locations(backend, cmd).await?,
        Command::Crops(cmd) => crop_records(backend, cmd).await?,
        Command::Alerts(cmd) => weather_alerts(backend, cmd).await?,
        Command::Market(cmd) => market_data(backend, cmd).await?,
        Command::Chat(cmd) => chat_session(backend, cmd).await?,
        Command::Get { collection, id } => {
            match documents::get_entity(backend, collection, &id).await? {
                Some(entity) => println!("{}", serde_json::to_string_pretty(&entity)?),
                None => println!("No document {}/{}", collection, id),
            }
        }
    }

    Ok(())
}

async fn status(backend: &Backend, config: &BackendConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Backend: {:?}", backend.kind());
    println!("  documents: {}", backend.documents().name());
    println!("  objects:   {}", backend.objects().name());
    println!("  auth:      {}", backend.auth().name());

    let missing = config.missing_required();
    if !missing.is_empty() {
        println!("Missing configuration: {}", missing.join(", "));
    }
    if let Some(project) = &config.project_id {
        println!("Project: {}", project);
    }
    if let Some(bucket) = config.resolved_storage_bucket() {
        println!("Bucket: {}", bucket);
    }

    if !backend.is_mock() {
        for kind in EntityKind::ALL {
            let all = Query::collection(kind.collection());
            let count = backend.documents().query(&all).await?.len();
            println!("  {:<14} {}", kind.collection(), count);
        }
    }
    Ok(())
}

async fn profile(backend: &Backend, cmd: ProfileCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ProfileCommand::Show(owner) => match users::get_user_profile(backend, &owner.user).await? {
            Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            None => println!("No profile for {}", owner.user),
        },
        ProfileCommand::Set {
            owner,
            display_name,
            farm_name,
            phone,
        } => {
            let update = UserProfileUpdate {
                display_name,
                farm_name,
                phone,
                ..Default::default()
            };
            users::update_user_profile(backend, &owner.user, &update).await?;
            println!("Updated profile {}", owner.user);
        }
    }
    Ok(())
}

async fn farm_locations(backend: &Backend, cmd: LocationCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        LocationCommand::List(owner) => {
            let found = locations::get_farm_locations(backend, &owner.user).await?;
            if found.is_empty() {
                println!("No locations");
            }
            for location in found {
                println!(
                    "{}  {:<20} {:>8.1} acres  {:<10} {:<10} {}",
                    location.id,
                    location.name,
                    location.area,
                    location.crop_type,
                    location.soil_type,
                    location.address
                );
            }
        }
        LocationCommand::Add {
            owner,
            name,
            address,
            area,
            crop,
            soil,
            lat,
            lng,
        } => {
            let location = NewFarmLocation {
                name,
                address,
                coordinates: lat.zip(lng).map(|(lat, lng)| Coordinates { lat, lng }),
                area,
                crop_type: crop,
                soil_type: soil,
            };
            let id = locations::add_farm_location(backend, &owner.user, &location).await?;
            println!("{}", id);
        }
        LocationCommand::Update { id, name, crop, area } => {
            let update = FarmLocationUpdate {
                name,
                crop_type: crop,
                area,
                ..Default::default()
            };
            locations::update_farm_location(backend, &id, &update).await?;
            println!("Updated {}", id);
        }
        LocationCommand::Delete { id } => {
            locations::delete_farm_location(backend, &id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

async fn crop_records(backend: &Backend, cmd: CropCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CropCommand::List(owner) => {
            for record in crops::get_crop_records(backend, &owner.user).await? {
                let health = record
                    .analysis
                    .as_ref()
                    .map(|a| format!("{} ({:?})", a.health_score, a.status))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {:<10} {:<16} health {:<14} {}",
                    record.id,
                    record.crop_type,
                    record.field_name,
                    health,
                    record.image_url.as_deref().unwrap_or("(no image)")
                );
            }
        }
        CropCommand::Add {
            owner,
            crop,
            field,
            notes,
            image,
        } => {
            let payload = image.as_deref().map(read_image).transpose()?;
            let record = NewCropRecord {
                crop_type: crop,
                field_name: field,
                notes,
                ..Default::default()
            };
            let id = crops::add_crop_record(backend, &owner.user, &record, payload).await?;
            println!("{}", id);
        }
    }
    Ok(())
}

fn read_image(path: &Path) -> Result<Payload, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or("image path has no file name")?;
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(Payload::new(file_name, bytes).with_content_type(content_type))
}

async fn weather_alerts(backend: &Backend, cmd: AlertCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AlertCommand::List(owner) => {
            for alert in weather::get_weather_alerts(backend, &owner.user).await? {
                println!(
                    "[{:?}] {} - {} {}",
                    alert.alert_type,
                    alert.title,
                    alert.description,
                    alert.time.as_deref().unwrap_or("")
                );
            }
        }
        AlertCommand::Add {
            owner,
            kind,
            title,
            description,
            time,
        } => {
            let alert = NewWeatherAlert {
                alert_type: kind.into(),
                title,
                description,
                time,
            };
            let id = weather::add_weather_alert(backend, &owner.user, &alert).await?;
            println!("{}", id);
        }
    }
    Ok(())
}

async fn market_data(backend: &Backend, cmd: MarketCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        MarketCommand::Prices { region } => {
            for price in market::get_market_prices(backend, region.as_deref()).await? {
                println!(
                    "{:<10} {:>9.2} {:<12} {:+.2} ({:+.2}%) {:?}  {} {}",
                    price.crop,
                    price.current_price,
                    price.unit,
                    price.change,
                    price.change_percent,
                    price.trend(),
                    price.market,
                    price.region.as_deref().unwrap_or("")
                );
            }
        }
        MarketCommand::Quote {
            crop,
            current,
            previous,
            unit,
            market: market_name,
            region,
        } => {
            let quote = NewMarketPrice {
                crop,
                current_price: current,
                previous_price: previous,
                unit,
                market: market_name,
                region,
            };
            let id = market::add_market_price(backend, &quote).await?;
            println!("{}", id);
        }
        MarketCommand::Alerts(owner) => {
            let prices = market::get_market_prices(backend, None).await?;
            let triggered = market::triggered_price_alerts(backend, &owner.user, &prices).await?;
            for alert in market::get_user_price_alerts(backend, &owner.user).await? {
                let hit = triggered.iter().any(|(t, _)| t.id == alert.id);
                println!(
                    "{} {} {:?} {:.2}{}",
                    alert.id,
                    alert.crop,
                    alert.direction,
                    alert.target_price,
                    if hit { "  (triggered)" } else { "" }
                );
            }
        }
        MarketCommand::Alert {
            owner,
            crop,
            target,
            direction,
        } => {
            let alert = NewPriceAlert {
                crop,
                target_price: target,
                direction: direction.into(),
            };
            let id = market::add_price_alert(backend, &owner.user, &alert).await?;
            println!("{}", id);
        }
    }
    Ok(())
}

async fn chat_session(backend: &Backend, cmd: ChatCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ChatCommand::History(owner) => {
            let history = chat::get_chat_history(backend, &owner.user).await?;
            if history.is_empty() {
                print_message_text(Sender::Ai, &Advisor::welcome().content);
            }
            for message in &history {
                print_message(message);
            }
        }
        ChatCommand::Send { owner, message } => {
            if message.trim().is_empty() {
                return Err("message is empty".into());
            }
            let advisor = Advisor::new();
            match chat::send_with_reply(backend, &advisor, &owner.user, &message).await {
                Ok(_) => {
                    print_message_text(Sender::User, message.trim());
                    print_message_text(Sender::Ai, Topic::detect(&message).reply());
                }
                Err(e) => {
                    print_message_text(Sender::Ai, &Advisor::unavailable().content);
                    return Err(e.into());
                }
            }
        }
        ChatCommand::Watch(owner) => {
            let printed = Arc::new(Mutex::new(0usize));
            let subscription = chat::subscribe_to_chat_messages(backend, &owner.user, move |messages| {
                let mut printed = match printed.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if messages.len() < *printed {
                    *printed = 0;
                }
                for message in &messages[*printed..] {
                    print_message(message);
                }
                *printed = messages.len();
            })
            .await?;

            info!("Watching chat for {} (ctrl-c to stop)", owner.user);
            tokio::signal::ctrl_c().await?;
            subscription.unsubscribe();
        }
    }
    Ok(())
}

fn print_message(message: &ChatMessage) {
    print_message_text(message.sender, &message.content);
}

fn print_message_text(sender: Sender, content: &str) {
    let who = match sender {
        Sender::User => "you",
        Sender::Ai => "advisor",
    };
    println!("{}> {}\n", who, content);
}
