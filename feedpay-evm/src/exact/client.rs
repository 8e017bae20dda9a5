//! Client-side signing for the EVM "exact" scheme.
//!
//! [`ExactEvmScheme`] turns a selected payment requirement into a signed
//! ERC-3009 authorization and encodes it for the `X-PAYMENT` header. The
//! digest is signed through [`Wallet::sign_hash`], so local keys and external
//! wallets share one code path.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolStruct, eip712_domain};
use feedpay::encoding::Base64Bytes;
use feedpay::error::PaymentError;
use feedpay::proto::{PaymentAuthorization, PaymentRequirement};
use feedpay::scheme::{ExactScheme, PaymentScheme};
use feedpay::timestamp::{UnixTimestamp, ValidityWindow};
use feedpay::wallet::signature_hex;
use feedpay::{Network, Wallet};
use rand::RngExt;
use rand::rng;

use crate::exact::{
    ExactEvmPayload, ExactEvmPayloadAuthorization, PaymentPayload, PaymentRequirementsExtra,
    TokenAmount, TransferWithAuthorization,
};
use crate::networks::{USDC_EIP712_VERSION, usdc_address, usdc_eip712_name};

/// How far `validAfter` is backdated, absorbing clock skew with the server.
pub const VALID_AFTER_SKEW_SECS: u64 = 10 * 60;

/// EIP-712 signing parameters for one ERC-3009 authorization.
#[derive(Debug, Clone)]
pub struct Eip3009SigningParams {
    /// The EIP-155 chain id.
    pub chain_id: u64,
    /// The token contract (EIP-712 verifying contract).
    pub asset_address: Address,
    /// The recipient.
    pub pay_to: Address,
    /// The amount to transfer.
    pub amount: U256,
    /// Validity window length in seconds.
    pub max_timeout_seconds: u64,
    /// EIP-712 domain name and version.
    pub domain: PaymentRequirementsExtra,
}

impl Eip3009SigningParams {
    /// Extracts signing parameters from a server requirement.
    ///
    /// Without usable `extra` domain data, the asset must be the USDC
    /// deployment of `network`, whose domain is known.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidRequirement`] if the asset, recipient or
    /// amount do not parse, or if no EIP-712 domain is known for the asset.
    pub fn from_requirement(
        requirement: &PaymentRequirement,
        network: Network,
    ) -> Result<Self, PaymentError> {
        let asset_address = requirement.asset.parse::<Address>().map_err(|e| {
            PaymentError::InvalidRequirement(format!("asset {:?}: {e}", requirement.asset))
        })?;
        let pay_to = requirement.pay_to.parse::<Address>().map_err(|e| {
            PaymentError::InvalidRequirement(format!("payTo {:?}: {e}", requirement.pay_to))
        })?;
        let amount = requirement
            .max_amount_required
            .parse::<TokenAmount>()
            .map_err(PaymentError::InvalidRequirement)?
            .into();
        let domain = match requirement
            .extra
            .clone()
            .and_then(|extra| serde_json::from_value::<PaymentRequirementsExtra>(extra).ok())
        {
            Some(domain) => domain,
            None if asset_address == usdc_address(network) => PaymentRequirementsExtra {
                name: usdc_eip712_name(network).to_owned(),
                version: USDC_EIP712_VERSION.to_owned(),
            },
            None => {
                return Err(PaymentError::InvalidRequirement(format!(
                    "no EIP-712 domain in `extra` for asset {asset_address}"
                )));
            }
        };
        Ok(Self {
            chain_id: network.chain_id(),
            asset_address,
            pay_to,
            amount,
            max_timeout_seconds: requirement.max_timeout_seconds,
            domain,
        })
    }
}

/// Signs an ERC-3009 `TransferWithAuthorization` as EIP-712 typed data.
///
/// The window opens [`VALID_AFTER_SKEW_SECS`] in the past and closes
/// `max_timeout_seconds` from now. Every call draws a fresh random nonce.
///
/// # Errors
///
/// Returns [`PaymentError::Wallet`] if the wallet refuses or fails to sign.
#[cfg_attr(
    feature = "telemetry",
    tracing::instrument(name = "feedpay.evm.sign_erc3009", skip_all, err, fields(chain_id = params.chain_id))
)]
pub async fn sign_erc3009_authorization(
    wallet: &dyn Wallet,
    params: &Eip3009SigningParams,
) -> Result<ExactEvmPayload, PaymentError> {
    let domain = eip712_domain! {
        name: params.domain.name.clone(),
        version: params.domain.version.clone(),
        chain_id: params.chain_id,
        verifying_contract: params.asset_address,
    };

    let window = ValidityWindow::around(
        UnixTimestamp::now(),
        VALID_AFTER_SKEW_SECS,
        params.max_timeout_seconds,
    );
    let nonce: [u8; 32] = rng().random();

    let authorization = ExactEvmPayloadAuthorization {
        from: wallet.address(),
        to: params.pay_to,
        value: params.amount.into(),
        valid_after: window.valid_after,
        valid_before: window.valid_before,
        nonce: B256::from(nonce),
    };

    let typed = TransferWithAuthorization {
        from: authorization.from,
        to: authorization.to,
        value: authorization.value.into(),
        validAfter: U256::from(authorization.valid_after.as_secs()),
        validBefore: U256::from(authorization.valid_before.as_secs()),
        nonce: authorization.nonce,
    };
    let signature = wallet.sign_hash(&typed.eip712_signing_hash(&domain)).await?;

    Ok(ExactEvmPayload {
        signature: signature_hex(&signature),
        authorization,
    })
}

/// The EVM "exact" [`PaymentScheme`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEvmScheme;

impl ExactEvmScheme {
    /// Creates the scheme.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PaymentScheme for ExactEvmScheme {
    fn scheme(&self) -> &str {
        ExactScheme::VALUE
    }

    async fn create_payment(
        &self,
        wallet: &dyn Wallet,
        requirement: &PaymentRequirement,
        network: Network,
        x402_version: u64,
    ) -> Result<PaymentAuthorization, PaymentError> {
        let params = Eip3009SigningParams::from_requirement(requirement, network)?;
        let payload = sign_erc3009_authorization(wallet, &params).await?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            network = %network,
            pay_to = %params.pay_to,
            amount = %params.amount,
            "signed exact payment authorization"
        );

        let document = PaymentPayload {
            x402_version,
            scheme: ExactScheme,
            network: requirement.network.clone(),
            payload,
        };
        let json = serde_json::to_vec(&document)?;
        Ok(PaymentAuthorization::new(
            x402_version,
            Base64Bytes::encode(&json).to_string(),
        ))
    }
}
