use crate::{
    components::camera::session::{SessionManager, SessionToken},
    devices::hardware::camera::IpCamera,
    error::{Error, Result},
};
use std::{
    fs::{create_dir_all, File},
    io::Write,
    path::PathBuf,
};

/// Destination for snapshot bytes.
pub trait SnapshotSink {
    /// Accept the whole image.
    fn write_snapshot(&mut self, image: &[u8]) -> std::io::Result<()>;

    /// Name used in log lines and errors.
    fn describe(&self) -> String;
}

/// Writes the snapshot to a named file, replacing what was there.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// * `path`: file the image is written to, parent directories are
    ///   created as needed.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSink for FileSink {
    fn write_snapshot(&mut self, image: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }
        let mut file = File::create(&self.path)?;
        file.write_all(image)?;
        file.sync_all()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Keeps the snapshot in memory.
impl SnapshotSink for Vec<u8> {
    fn write_snapshot(&mut self, image: &[u8]) -> std::io::Result<()> {
        self.clear();
        self.extend_from_slice(image);
        Ok(())
    }

    fn describe(&self) -> String {
        String::from("memory")
    }
}

/// Fetch one snapshot with an already obtained token.
///
/// * `camera`: device to take the image from.
/// * `token`: session token presented as the cookie credential.
pub async fn fetch_snapshot(camera: &IpCamera, token: &SessionToken) -> Result<Vec<u8>> {
    let image = camera.snapshot_raw(token.name()).await?;

    match image::guess_format(&image) {
        Ok(format) => tracing::debug!(
            camera = %camera.get_uuid(),
            bytes = image.len(),
            format = ?format,
            "Snapshot received"
        ),
        Err(_) => tracing::warn!(
            camera = %camera.get_uuid(),
            bytes = image.len(),
            "Snapshot is not a recognised image format"
        ),
    }
    Ok(image)
}

/// Hand the image to the sink, mapping a refusal to a persist failure.
///
/// * `image`: bytes to store.
/// * `sink`: destination.
pub fn persist_snapshot<S: SnapshotSink + ?Sized>(image: &[u8], sink: &mut S) -> Result<usize> {
    sink.write_snapshot(image).map_err(|source| Error::Persist {
        target: sink.describe(),
        source,
    })?;
    Ok(image.len())
}

/// Unit struct grouping the one shot snapshot step of the control path.
pub struct SnapshotController;

impl SnapshotController {
    /// Log in if needed, fetch a single image and write it to the sink.
    /// Nothing reaches the sink unless the whole image was fetched.
    /// Returns the number of bytes written.
    ///
    /// * `session`: session of the camera, its token is reused when held.
    /// * `sink`: destination for the image.
    pub async fn capture<S: SnapshotSink + ?Sized>(
        session: &mut SessionManager,
        sink: &mut S,
    ) -> Result<usize> {
        let token = session.ensure_token().await?.clone();
        let image = fetch_snapshot(session.camera(), &token).await?;
        let written = persist_snapshot(&image, sink)?;

        tracing::info!(
            camera = %session.camera().get_uuid(),
            bytes = written,
            sink = %sink.describe(),
            "Snapshot saved"
        );
        Ok(written)
    }
}
