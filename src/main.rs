use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use stayhub::application::proof::ProofUpload;
use stayhub::application::service::{BookingService, NewBooking};
use stayhub::domain::actor::Actor;
use stayhub::domain::booking::{Amount, Booking};
use stayhub::domain::ports::{BookingLedgerBox, CatalogBox, NotifierHandle};
use stayhub::domain::transition::Action;
use stayhub::error::BookingError;
use stayhub::infrastructure::in_memory::{InMemoryLedger, StaticCatalog};
use stayhub::infrastructure::notify::LogNotifier;
use stayhub::interfaces::csv::action_reader::{ActionReader, ActionRecord};
use stayhub::interfaces::csv::booking_writer::BookingWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input booking action CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Nightly base price the replay catalog quotes for every room.
    #[arg(long, default_value = "100")]
    base_price: Decimal,
}

#[tokio::main]
async fn main() -> Result<()> {
    // keep stdout clean for the snapshot dump
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();

    let ledger: BookingLedgerBox = match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => Box::new(
            stayhub::infrastructure::rocksdb::RocksDbLedger::open(db_path).into_diagnostic()?,
        ),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            miette::bail!("built without RocksDB support; rebuild with --features storage-rocksdb")
        }
        None => Box::new(InMemoryLedger::new()),
    };

    let base_price = Amount::new(cli.base_price).into_diagnostic()?;
    let catalog: CatalogBox = Box::new(StaticCatalog::with_flat_price(base_price));
    let notifier: NotifierHandle = Arc::new(LogNotifier);
    let service = BookingService::new(ledger, catalog, notifier);

    // Replay actions
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = ActionReader::new(file);
    for record in reader.records() {
        match record {
            Ok(record) => {
                if let Err(e) = dispatch(&service, record).await {
                    eprintln!("Error applying action: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading action: {}", e);
            }
        }
    }

    // Collect final state from the ledger
    let bookings = service.into_snapshots().await.into_diagnostic()?;

    // Output final state
    let stdout = io::stdout();
    let mut writer = BookingWriter::new(stdout.lock());
    writer.write_bookings(bookings).into_diagnostic()?;

    Ok(())
}

async fn dispatch(
    service: &BookingService,
    record: ActionRecord,
) -> stayhub::error::Result<Booking> {
    let actor = Actor::new(record.actor, record.role);
    match record.action {
        Action::Create => {
            let request = NewBooking {
                id: record.booking,
                room_id: record.room.ok_or_else(|| missing("room"))?,
                tenant_owner_id: record.tenant.ok_or_else(|| missing("tenant"))?,
                check_in: record.check_in.ok_or_else(|| missing("check_in"))?,
                check_out: record.check_out.ok_or_else(|| missing("check_out"))?,
                guests: record.guests.ok_or_else(|| missing("guests"))?,
            };
            service.create_booking(actor, request).await
        }
        Action::UploadProof => {
            let upload = ProofUpload {
                file_url: record.file_url.ok_or_else(|| missing("file_url"))?,
                size_bytes: record.file_size.ok_or_else(|| missing("file_size"))?,
                content_type: record.content_type.ok_or_else(|| missing("content_type"))?,
            };
            service
                .upload_payment_proof(record.booking, actor, upload)
                .await
        }
        Action::Cancel => service.cancel_booking(record.booking, actor).await,
        Action::Approve => service.approve_booking(record.booking, actor).await,
        Action::Reject => service.reject_booking(record.booking, actor).await,
        Action::Remind => service.send_reminder(record.booking, actor).await,
        Action::Complete => {
            let as_of = record.as_of.ok_or_else(|| missing("as_of"))?;
            service.complete_booking(record.booking, actor, as_of).await
        }
    }
}

fn missing(column: &str) -> BookingError {
    BookingError::Validation(format!("missing {} column for action", column))
}
