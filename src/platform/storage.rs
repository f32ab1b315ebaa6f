//! Durable storage holding named blobs (a littlefs file, a flash sector…).
//! Opening and closing the underlying medium is the implementation's concern.

/// Named-blob storage used for the settings record.
pub trait SettingsStorage {
    type Error: core::fmt::Debug;

    /// Read blob `name` into `buf`, returning the number of bytes read.
    fn read<'a>(
        &'a mut self,
        name: &'a str,
        buf: &'a mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, Self::Error>> + 'a;

    /// Replace blob `name` with `data`, creating it when missing and
    /// truncating any previous content.
    fn write<'a>(
        &'a mut self,
        name: &'a str,
        data: &'a [u8],
    ) -> impl core::future::Future<Output = Result<(), Self::Error>> + 'a;
}
