//! Pipe round-trip demo.
//!
//! Encodes a handful of messages on one end of an in-memory duplex pipe
//! and decodes them lazily on the other.
//!
//! ```sh
//! cargo run --example pipe
//! ```

use cobswire::{ChunkSource, CobsWriter, MessageReader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = tokio::io::duplex(64);

    let producer = tokio::spawn(async move {
        let mut writer = CobsWriter::new(tx);
        let messages: [&[u8]; 4] = [
            b"hello",
            &[0x00, 0x01, 0x02, 0x00],
            b"",
            b"a longer message that spans several pipe chunks",
        ];
        for message in messages {
            writer.send(message);
            writer.flush().await.unwrap();
        }
        // Dropping the writer closes the pipe and ends the stream.
    });

    let mut source = ChunkSource::new(rx);
    let mut reader = MessageReader::new(&mut source);
    while let Some(message) = reader.next_message().await? {
        println!("received {:>2} bytes: {:02x?}", message.len(), message);
    }
    println!("stream ended");

    producer.await?;
    Ok(())
}
