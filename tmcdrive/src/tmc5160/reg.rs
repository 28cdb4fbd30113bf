//! Declaration of the TMC5160 registers and their fields.
//!
//! Please refer to the TMC5160 datasheet for what each register and field means. The register map
//! is described under section 6 of the datasheet.
//!
//! https://www.trinamic.com/fileadmin/assets/Products/ICs_Documents/TMC5160A_Datasheet_Rev1.17.pdf

use super::field::{AccessMode, Field, RegisterDescriptor};

macro_rules! access {
    (R) => {
        AccessMode::ReadOnly
    };
    (W) => {
        AccessMode::WriteOnly
    };
    (RW) => {
        AccessMode::ReadWrite
    };
    (RWC) => {
        AccessMode::ReadWriteClearOnRead
    };
}

// Each line is `MODE ADDRESS NAME { FIELD: lsb, bits; ... }`.
macro_rules! impl_registers {
    ($(
        $RW:ident $addr:literal $T:ident { $($F:ident: $lsb:literal, $bits:literal;)* }
    )*) => {
        &[$(
            RegisterDescriptor {
                name: stringify!($T),
                address: $addr,
                mode: access!($RW),
                fields: &[$(
                    Field { name: stringify!($F), lsb: $lsb, bits: $bits },
                )*],
            },
        )*]
    };
}

/// Every register the driver knows about.
pub static TMC5160_REGISTERS: &[RegisterDescriptor] = impl_registers! {
    // General Registers.
    RW 0x00 GCONF {
        RECALIBRATE: 0, 1;
        FASTSTANDSTILL: 1, 1;
        EN_PWM_MODE: 2, 1;
        MULTISTEP_FILT: 3, 1;
        SHAFT: 4, 1;
        DIAG0_STEP: 7, 1;   // SD_MODE=0, shares bit 7 with DIAG0_STALL
        DIAG1_DIR: 8, 1;    // SD_MODE=0, shares bit 8 with DIAG1_STALL
        DIAG0_INT_PUSHPULL: 12, 1;
        DIAG1_POSCOMP_PUSHPULL: 13, 1;
        SMALL_HYSTERESIS: 14, 1;
        STOP_ENABLE: 15, 1;
        DIRECT_MODE: 16, 1;
        TEST_MODE: 17, 11;
    }
    RWC 0x01 GSTAT {
        RESET: 0, 1;
        DRV_ERR: 1, 1;
        UV_CP: 2, 1;
    }
    R 0x04 IOIN {
        REFL_STEP: 0, 1;
        REFR_DIR: 1, 1;
        ENCB_DCEN_CFG4: 2, 1;
        ENCA_DCIN_CFG5: 3, 1;
        DRV_ENN: 4, 1;
        ENC_N_DCO_CFG6: 5, 1;
        SD_MODE: 6, 1;
        SWCOMP_IN: 7, 1;
        VERSION: 24, 8;
    }
    W 0x05 X_COMPARE {
        X_COMPARE: 0, 32;
    }
    RW 0x08 FACTORY_CONF {
        FCLKTRIM: 0, 32;
    }
    W 0x09 SHORT_CONF {
        S2VS_LEVEL: 0, 4;
        S2G_LEVEL: 8, 4;
        SHORTFILTER: 16, 2;
        shortdelay: 18, 1;
    }
    W 0x0A DRV_CONF {
        BBMTIME: 0, 5;
        BBMCLKS: 8, 4;
        OTSELECT: 16, 2;
        DRVSTRENGTH: 18, 2;
        FILT_ISENSE: 20, 2;
    }
    W 0x0B GLOBAL_SCALER {
        GLOBAL_SCALER: 0, 8;
    }
    R 0x0C OFFSET_READ {
        PHASE_B: 0, 8;
        PHASE_A: 8, 8;
    }

    // Velocity Dependent Control.
    W 0x10 IHOLD_IRUN {
        IHOLD: 0, 5;
        IRUN: 8, 5;
        IHOLDDELAY: 16, 4;
    }
    W 0x11 TPOWERDOWN {
        TPOWERDOWN: 0, 8;
    }
    RW 0x12 TSTEP {
        TSTEP: 0, 20;
    }
    W 0x13 TPWMTHRS {
        TPWMTHRS: 0, 20;
    }
    W 0x14 TCOOLTHRS {
        TCOOLTHRS: 0, 20;
    }
    W 0x15 THIGH {
        THIGH: 0, 20;
    }

    // Ramp Generator Motion Control Register Set
    RW 0x20 RAMPMODE {
        RAMPMODE: 0, 2;
    }
    RW 0x21 XACTUAL {
        XACTUAL: 0, 32;
    }
    R 0x22 VACTUAL {
        VACTUAL: 0, 24;
    }
    W 0x23 VSTART {
        VSTART: 0, 18;
    }
    W 0x24 A1 {
        A1: 0, 16;
    }
    W 0x25 V1 {
        V1: 0, 20;
    }
    W 0x26 AMAX {
        AMAX: 0, 16;
    }
    W 0x27 VMAX {
        VMAX: 0, 23;
    }
    W 0x28 DMAX {
        DMAX: 0, 16;
    }
    W 0x2A D1 {
        D1: 0, 16;
    }
    W 0x2B VSTOP {
        VSTOP: 0, 18;
    }
    W 0x2C TZEROWAIT {
        TZEROWAIT: 0, 16;
    }
    RW 0x2D XTARGET {
        XTARGET: 0, 32;
    }

    // Ramp Generator Driver Feature Control Register Set
    W 0x33 VDCMIN {
        VDCMIN: 0, 23;
    }
    RW 0x34 SW_MODE {
        STOP_L_ENABLE: 0, 1;
        STOP_R_ENABLE: 1, 1;
        POL_STOP_L: 2, 1;
        POL_STOP_R: 3, 1;
        SWAP_LR: 4, 1;
        LATCH_L_ACTIVE: 5, 1;
        LATCH_L_INACTIVE: 6, 1;
        LATCH_R_ACTIVE: 7, 1;
        LATCH_R_INACTIVE: 8, 1;
        EN_LATCH_ENCODER: 9, 1;
        SG_STOP: 10, 1;
        EN_SOFTSTOP: 11, 1;
    }
    RWC 0x35 RAMP_STAT {
        STATUS_STOP_L: 0, 1;
        STATUS_STOP_R: 1, 1;
        STATUS_LATCH_L: 2, 1;
        STATUS_LATCH_R: 3, 1;
        EVENT_STOP_L: 4, 1;
        EVENT_STOP_R: 5, 1;
        EVENT_STOP_SG: 6, 1;
        EVENT_POS_REACHED: 7, 1;
        VELOCITY_REACHED: 8, 1;
        POSITION_REACHED: 9, 1;
        VZERO: 10, 1;
        T_ZEROWAIT_ACTIVE: 11, 1;
        SECOND_MOVE: 12, 1;
        STATUS_SG: 13, 1;
    }
    R 0x36 XLATCH {
        XLATCH: 0, 32;
    }

    // Encoder Registers
    RW 0x38 ENCMODE {
        ENC_SEL_DECIMAL: 0, 1;
        LATCH_X_ACT: 1, 1;
        CLR_ENC_X: 2, 1;
        NEG_EDGE: 3, 1;
        POS_EDGE: 4, 1;
        CLR_ONCE: 5, 1;
        CLR_CONT: 6, 1;
        IGNORE_AB: 7, 1;
        POL_N: 8, 1;
        POL_B: 9, 1;
        POL_A: 10, 1;
    }
    RW 0x39 X_ENC {
        X_ENC: 0, 32;
    }
    W 0x3A ENC_CONST {
        ENC_CONST: 0, 32;
    }
    RWC 0x3B ENC_STATUS {
        n_event: 0, 1;
        deviation_warn: 1, 1;
    }
    R 0x3C ENC_LATCH {
        ENC_LATCH: 0, 32;
    }
    W 0x3D ENC_DEVIATION {
        ENC_DEVIATION: 0, 20;
    }

    // Motor Driver Registers
    RW 0x60 MSLUT0 {
        LUT: 0, 32;
    }
    W 0x61 MSLUT1 {
        LUT: 0, 32;
    }
    W 0x62 MSLUT2 {
        LUT: 0, 32;
    }
    W 0x63 MSLUT3 {
        LUT: 0, 32;
    }
    W 0x64 MSLUT4 {
        LUT: 0, 32;
    }
    W 0x65 MSLUT5 {
        LUT: 0, 32;
    }
    W 0x66 MSLUT6 {
        LUT: 0, 32;
    }
    W 0x67 MSLUT7 {
        LUT: 0, 32;
    }
    W 0x68 MSLUTSEL {
        W0: 0, 2;
        W1: 2, 2;
        W2: 4, 2;
        W3: 6, 2;
        X1: 8, 8;
        X2: 16, 8;
        X3: 24, 8;
    }
    W 0x69 MSLUTSTART {
        START_SIN: 0, 8;
        START_SIN90: 16, 8;
    }
    R 0x6A MSCNT {
        MSCNT: 0, 10;
    }
    R 0x6B MSCURACT {
        CUR_B: 0, 8;
        CUR_A: 16, 8;
    }

    // Chopper Control Registers.
    RW 0x6C CHOPCONF {
        TOFF: 0, 4;
        HSTRT: 4, 3;    // TFD[2..0] when CHM=1
        HEND: 7, 4;     // OFFSET when CHM=1
        DISFDCC: 12, 1;
        CHM: 14, 1;
        TBL: 15, 2;
        VHIGHFS: 18, 1;
        VHIGHCHM: 19, 1;
        TPFD: 20, 4;
        MRES: 24, 4;
        INTPOL: 28, 1;
        DEDGE: 29, 1;
        DISS2G: 30, 1;
        DISS2VS: 31, 1;
    }
    W 0x6D COOLCONF {
        SEMIN: 0, 4;
        SEUP: 5, 2;
        SEMAX: 8, 4;
        SEDN: 13, 2;
        SEIMIN: 15, 1;
        SGT: 16, 7;
        SFILT: 24, 1;
    }
    W 0x6E DCCTRL {
        DCCTRL: 0, 24;
    }
    R 0x6F DRV_STATUS {
        SG_RESULT: 0, 10;
        S2VSA: 12, 1;
        S2VSB: 13, 1;
        STEALTH: 14, 1;
        FSACTIVE: 15, 1;
        CS_ACTUAL: 16, 5;
        STALLGUARD: 24, 1;
        OT: 25, 1;
        OTPW: 26, 1;
        S2GA: 27, 1;
        S2GB: 28, 1;
        OLA: 29, 1;
        OLB: 30, 1;
        STST: 31, 1;
    }
    W 0x70 PWMCONF {
        PWM_OFS: 0, 8;
        PWM_GRAD: 8, 8;
        PWM_FREQ: 16, 2;
        PWM_AUTOSCALE: 18, 1;
        PWM_AUTOGRAD: 19, 1;
        FREEWHEEL: 20, 2;
        PWM_REG: 24, 4;
        PWM_LIM: 28, 4;
    }
    R 0x71 PWM_SCALE {
        PWM_SCALE_SUM: 0, 8;
        PWM_SCALE_AUTO: 16, 8;
    }
    R 0x72 PWM_AUTO {
        PWM_OFS_AUTO: 0, 8;
        PWM_GRAD_AUTO: 16, 8;
    }
    R 0x73 LOST_STEPS {
        LOST_STEPS: 0, 20;
    }
};

// Sanity Checks
// --------------------------------------------------------

#[test]
fn test_catalog_size() {
    assert_eq!(TMC5160_REGISTERS.len(), 58);
}

#[test]
fn test_catalog_layouts_are_valid() {
    for reg in TMC5160_REGISTERS {
        assert_eq!(reg.validate(), Ok(()), "{}", reg.name);
    }
}

#[test]
fn test_chopconf() {
    let chopconf = TMC5160_REGISTERS.iter().find(|r| r.name == "CHOPCONF").unwrap();
    assert_eq!(chopconf.address, 0x6C);
    assert_eq!(chopconf.mode, AccessMode::ReadWrite);
    let v = chopconf.set_fields(0, [("TOFF", 3), ("HSTRT", 4), ("HEND", 1), ("TBL", 2)]).unwrap();
    assert_eq!(v, 0x0001_00C3);
}
