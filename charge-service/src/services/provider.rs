//! Payment-provider artifacts for PIX and boleto charges.
//!
//! The trait is the seam for a real provider integration; [`MockProvider`]
//! generates collision-resistant placeholders in the provider's wire formats.

use rand::Rng;
use uuid::Uuid;

/// Provider-supplied PIX payload.
#[derive(Debug, Clone)]
pub struct PixArtifacts {
    pub qr_code: String,
    pub emv_code: String,
}

/// Provider-supplied boleto payload.
#[derive(Debug, Clone)]
pub struct BoletoArtifacts {
    pub barcode: String,
    pub digitable_line: String,
    pub boleto_url: String,
}

/// Source of provider-side payment artifacts.
pub trait PaymentProvider: Send + Sync {
    fn pix_artifacts(&self) -> PixArtifacts;
    fn boleto_artifacts(&self) -> BoletoArtifacts;
}

/// Stand-in provider. Payloads follow the BR Code / FEBRABAN shapes but are
/// not registered with any institution.
#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    fn random_digits(len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len).map(|_| rng.gen_range(0..10).to_string()).collect()
    }
}

impl PaymentProvider for MockProvider {
    fn pix_artifacts(&self) -> PixArtifacts {
        let key = Uuid::new_v4();
        PixArtifacts {
            qr_code: format!("00020126580014br.gov.bcb.pix0136{key}520400005303986"),
            emv_code: format!("00020126580014br.gov.bcb.pix0136{key}5204000053039865802BR"),
        }
    }

    fn boleto_artifacts(&self) -> BoletoArtifacts {
        let barcode = format!("2379{}", Self::random_digits(40));
        // FEBRABAN digitable line layout: 5.5 6.6 5.6 1 14
        let digitable_line = format!(
            "{}.{} {}.{} {}.{} {} {}",
            &barcode[0..5],
            &barcode[5..10],
            &barcode[10..16],
            &barcode[16..22],
            &barcode[22..27],
            &barcode[27..33],
            &barcode[33..34],
            &barcode[34..44],
        );
        BoletoArtifacts {
            barcode,
            digitable_line,
            boleto_url: format!("https://boleto.example.com/{}", Uuid::new_v4()),
        }
    }
}
