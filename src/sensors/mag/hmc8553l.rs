use rppal::i2c::I2c;

use super::registry;
use crate::i2c::I2CBit;

/// Résolution au gain par défaut (LSB par gauss, CONF B = 0x20).
const LSB_PER_GAUSS: f64 = 1090.0;
/// 1 gauss = 100 microteslas.
const MICROTESLA_PER_GAUSS: f64 = 100.0;

pub(crate) struct HMC8553L;

impl HMC8553L {
    /// Constructeur
    pub(crate) fn new(i2c: &mut I2c) -> anyhow::Result<Self> {
        let mag = HMC8553L;

        // Prépare le module à être utilisé
        mag.set_slave(i2c)?;
        mag.init_module(i2c)?;

        Ok(mag)
    }

    fn set_slave(&self, i2c: &mut I2c) -> anyhow::Result<()> {
        i2c.set_slave_address(registry::HMC8553L_MAG_ADDR)?;
        Ok(())
    }

    /// Initialise rapidement le module avec des valeurs pré-défini
    fn init_module(&self, i2c: &mut I2c) -> anyhow::Result<()> {
        println!("[HMC8553L] Initialisation ...");

        // Configuration par défaut pour le HMC8553L
        i2c.ecriture_word(registry::HMC8553L_CONF_A, 0x10)?;
        i2c.ecriture_word(registry::HMC8553L_CONF_B, 0x20)?;

        // Activation de la mesure continue
        i2c.ecriture_word(registry::HMC8553L_MODE, 0x00)?;

        println!("[HMC8553L] Fin d'initialisation.");

        Ok(())
    }

    fn get_axis_raw(&self, i2c: &mut I2c, reg_h: u8, reg_l: u8) -> anyhow::Result<i16> {
        let high = i2c.lecture_word(reg_h)?;
        let low = i2c.lecture_word(reg_l)?;
        Ok(((high as i16) << 8) | low as i16)
    }

    /// Lit les trois axes et convertit en microteslas. Aucune calibration,
    /// aucune correction : la valeur sort telle que le capteur la produit.
    pub(crate) fn read_microteslas(&self, i2c: &mut I2c) -> anyhow::Result<(f64, f64, f64)> {
        // Défini mon capteur sur le bus I2C
        self.set_slave(i2c)?;

        // Le module expose ses registres dans l'ordre X, Z, Y
        let raw_x = self.get_axis_raw(i2c, registry::HMC8553L_X_H, registry::HMC8553L_X_L)?;
        let raw_z = self.get_axis_raw(i2c, registry::HMC8553L_Z_H, registry::HMC8553L_Z_L)?;
        let raw_y = self.get_axis_raw(i2c, registry::HMC8553L_Y_H, registry::HMC8553L_Y_L)?;

        let scale = MICROTESLA_PER_GAUSS / LSB_PER_GAUSS;
        Ok((
            raw_x as f64 * scale,
            raw_y as f64 * scale,
            raw_z as f64 * scale,
        ))
    }
}
