//! x402 payment negotiation and the single paid retry.
//!
//! [`PaymentNegotiator`] turns a `402 Payment Required` body into a
//! [`PaymentAuthorization`]. [`PaymentMiddleware`] sits in the reqwest
//! middleware stack: when a request carrying a [`PaymentContext`] comes back
//! 402, it negotiates a payment and re-sends the request once, with its
//! original headers plus the payment header. Whatever the retry returns,
//! including another 402, is handed back unchanged.

use std::sync::Arc;

use feedpay::error::PaymentError;
use feedpay::proto::{PaymentAuthorization, PaymentRequired};
use feedpay::scheme::PaymentScheme;
use feedpay::{Network, Wallet};
use http::{Extensions, HeaderName, HeaderValue, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};

/// Selects a payment requirement and has it signed.
#[derive(Clone)]
pub struct PaymentNegotiator {
    network: Network,
    scheme: Arc<dyn PaymentScheme>,
}

impl std::fmt::Debug for PaymentNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentNegotiator")
            .field("network", &self.network)
            .field("scheme", &self.scheme.scheme())
            .finish()
    }
}

impl PaymentNegotiator {
    /// Pays on `network` using `scheme`.
    #[must_use]
    pub fn new(network: Network, scheme: Arc<dyn PaymentScheme>) -> Self {
        Self { network, scheme }
    }

    /// The network requirements must match.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Builds the authorization for a 402 response body.
    ///
    /// The first requirement in server order whose network and scheme match
    /// wins; no other network is tried.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::MalformedPaymentResponse`] if `body` has no `accepts` array
    /// - [`PaymentError::NoMatchingPaymentRequirement`] if nothing matches
    /// - [`PaymentError::InvalidRequirement`] if the first match does not decode
    /// - any error of the scheme, e.g. [`PaymentError::Wallet`]
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "feedpay.payment.build_authorization", skip_all, err)
    )]
    pub async fn build_payment_authorization(
        &self,
        wallet: &dyn Wallet,
        body: &[u8],
    ) -> Result<PaymentAuthorization, PaymentError> {
        let payment_required = PaymentRequired::from_slice(body)?;
        let requirement = payment_required.select(self.network, self.scheme.scheme())?;

        #[cfg(feature = "telemetry")]
        debug!(
            network = %requirement.network,
            scheme = %requirement.scheme,
            amount = %requirement.max_amount_required,
            x402_version = payment_required.x402_version,
            "selected payment requirement"
        );

        self.scheme
            .create_payment(
                wallet,
                &requirement,
                self.network,
                payment_required.x402_version,
            )
            .await
    }
}

/// Request extension enabling the paid retry for one request.
///
/// Carries the wallet snapshot taken when the request was built, so a wallet
/// swapped in later cannot pay for it.
#[derive(Clone)]
pub struct PaymentContext {
    wallet: Arc<dyn Wallet>,
}

impl std::fmt::Debug for PaymentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentContext")
            .field("wallet", &self.wallet.address())
            .finish()
    }
}

impl PaymentContext {
    /// Pays with `wallet` if the request comes back 402.
    #[must_use]
    pub fn new(wallet: Arc<dyn Wallet>) -> Self {
        Self { wallet }
    }
}

/// Middleware performing at most one paid retry per request.
#[derive(Debug, Clone)]
pub struct PaymentMiddleware {
    negotiator: PaymentNegotiator,
}

impl PaymentMiddleware {
    /// Wraps `negotiator`.
    #[must_use]
    pub const fn new(negotiator: PaymentNegotiator) -> Self {
        Self { negotiator }
    }
}

#[cfg_attr(feature = "telemetry", instrument(name = "feedpay.http.next", skip_all))]
async fn run_next(
    next: rqm::Next<'_>,
    req: Request,
    extensions: &mut Extensions,
) -> rqm::Result<Response> {
    next.run(req, extensions).await
}

#[async_trait::async_trait]
impl rqm::Middleware for PaymentMiddleware {
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "feedpay.http.handle", skip_all, err)
    )]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let Some(context) = extensions.get::<PaymentContext>().cloned() else {
            return run_next(next, req, extensions).await;
        };
        let retry_req = req.try_clone();
        let res = run_next(next.clone(), req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "no payment required");
            return Ok(res);
        }
        // Without a replayable body the 402 is the caller's to handle.
        let Some(mut retry) = retry_req else {
            return Ok(res);
        };

        #[cfg(feature = "telemetry")]
        info!(url = %res.url(), "received 402 Payment Required, negotiating payment");

        let body = res.bytes().await?;
        let authorization = self
            .negotiator
            .build_payment_authorization(context.wallet.as_ref(), &body)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;

        let name = HeaderName::from_static(authorization.header_name());
        let value = HeaderValue::from_str(authorization.as_str()).map_err(|_| {
            rqm::Error::Middleware(
                PaymentError::InvalidRequirement(
                    "payment authorization is not a valid header value".to_owned(),
                )
                .into(),
            )
        })?;
        retry.headers_mut().insert(name, value);

        #[cfg(feature = "telemetry")]
        trace!(url = %retry.url(), "retrying request with payment header");

        run_next(next, retry, extensions).await
    }
}
