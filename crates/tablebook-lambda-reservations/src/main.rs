//! AWS Lambda function for table reservations.

use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tablebook_lambda_reservations::run().await
}
