//! Cancellation and resume demo.
//!
//! Shows both ways to stop a consumption pass without closing the source —
//! an external cancellation token and the source-directed cancel request —
//! then resumes reading exactly where the stopped pass left off.
//!
//! ```sh
//! cargo run --example cancel
//! ```

use cobswire::{ChunkSource, CobsWriter, FrameSource, MessageReader};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = tokio::io::duplex(4096);

    let mut writer = CobsWriter::new(tx);
    for i in 0u8..5 {
        writer.send(format!("message {i}").as_bytes());
    }
    writer.flush().await?;

    let mut source = ChunkSource::new(rx);

    // Pass 1: stop via the cancellation token after two messages.
    let cancel = CancellationToken::new();
    {
        let mut reader = MessageReader::with_cancellation(&mut source, cancel.clone());
        let mut seen = 0;
        while let Some(message) = reader.next_message().await? {
            println!("pass 1: {}", String::from_utf8_lossy(message));
            seen += 1;
            if seen == 2 {
                cancel.cancel();
            }
        }
    }
    println!("pass 1 canceled, source still open");

    // Pass 2: stop via the source's cancel handle once the pipe runs dry.
    let handle = source.cancel_handle();
    {
        let mut reader = MessageReader::new(&mut source);
        let canceler = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            handle.cancel_pending_read();
        });
        while let Some(message) = reader.next_message().await? {
            println!("pass 2: {}", String::from_utf8_lossy(message));
        }
        canceler.await?;
    }
    println!("pass 2 canceled after draining the remaining messages");

    Ok(())
}
