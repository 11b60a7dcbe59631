use reqwest::{
    Method,
    multipart::{Form, Part},
};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWrite;
use uuid::Uuid;

use crate::{
    Client,
    endpoints::LexofficeEndpoint,
    error::{LegacyErrorResponse, Result},
};

/// Uploaded files are always stored as vouchers.
pub const VOUCHER_TYPE: &str = "voucher";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    pub id: Uuid,
}

/// Builds the upload form: the content as part `file`, plus `type=voucher`.
fn upload_form(file_name: &str, content: &[u8]) -> Form {
    let part = Part::bytes(content.to_vec()).file_name(file_name.to_owned());
    Form::new().part("file", part).text("type", VOUCHER_TYPE)
}

/// Upload a voucher file (PDF or image).
#[instrument(skip(client, content), fields(size = content.len()))]
pub async fn upload(client: &Client, file_name: &str, content: &[u8]) -> Result<FileReference> {
    client
        .request(Method::POST, LexofficeEndpoint::Files)
        .multipart(upload_form(file_name, content))
        .fetch::<_, LegacyErrorResponse>()
        .await
        .map_err(|e| e.context("error uploading file"))
}

/// Download a file, streaming its content into `writer`.
#[instrument(skip(client, writer))]
pub async fn download<W>(client: &Client, file_id: Uuid, writer: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    client
        .request(Method::GET, LexofficeEndpoint::File(file_id))
        .accept("*/*")
        .download::<LegacyErrorResponse, W>(writer)
        .await
        .map_err(|e| e.context("error downloading file"))
}
