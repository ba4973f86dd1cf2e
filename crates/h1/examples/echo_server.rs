//! Echoes every request back as a `text/plain` response.
//!
//! ```sh
//! cargo run --example echo_server
//! curl -v -d 'hello' http://127.0.0.1:8080/echo?x=1
//! ```

use micro_h1::codec::{DEFAULT_MAX_CONTENT_LENGTH, HttpParser, ParserOptions};
use micro_h1::connection::{Connection, Writer};
use micro_h1::protocol::{HttpError, Message, SendError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = Connection::new(reader, writer).with_remote_addr(remote_addr);
            match serve(connection).await {
                Ok(()) => info!(%remote_addr, "finished serving, connection shutdown"),
                Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}

async fn serve<R, W>(mut connection: Connection<R, W>) -> Result<(), HttpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let options = ParserOptions::new().max_content_length(DEFAULT_MAX_CONTENT_LENGTH);
    let mut parser = HttpParser::with_options(true, options)?;
    let mut request = Message::request();

    while connection.is_open() {
        match request.receive(&mut connection, &mut parser).await {
            Ok(consumed) => info!(consumed, first_line = %request.first_line(), "received request"),
            Err(e) if e.is_premature_eof() && e.bytes_read() == 0 => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let mut writer = Writer::response(&mut connection, &request);
        writer.message_mut().set_content_type(mime::TEXT_PLAIN_UTF_8.as_ref());
        writer.write_text(&format!("{} from {}\n", request.first_line(), request.remote_ip()));

        if request.content().is_empty() {
            writer.send().await?;
        } else {
            writer.send_chunk().await?;
            writer.clear();
            writer.write_no_copy(request.content());
            writer.send_final_chunk().await?;
        }
        drop(writer);

        connection.finish().await.map_err(SendError::io)?;
    }

    Ok(())
}
