//! # 逐点参数的扁平键值往返
//!
//! 把一个数据点的全部可调旋钮（强度列标签、图像积分 ROI/旋转角/
//! 背景拟合设置、几何校正参数）展开成扁平的字符串键值映射，
//! 并支持反向写回；这是在点与点之间拷贝设置的稳定序列化形式。
//!
//! 写回只更新设置本身，不触发归算；调用方随后用
//! `integrate_point` 让新设置生效。
//!
//! ## 键
//! `I` `Inorm` `Ierr` `Ibgr` `image roi` `image rotangle`
//! `bgr flag` `bgr col nbgr` `bgr col width` `bgr col power`
//! `bgr col tan` `bgr row nbgr` `bgr row width` `bgr row power`
//! `bgr row tan` `bgr nline` `bgr filter` `bgr compress`
//! `geom` `scale` `polarization fh` `beam_slits` `det_slits`
//! `sample dia` `sample polygon` `sample angles`
//!
//! ## 依赖关系
//! - 被 `commands/inspect.rs` 使用
//! - 读写 `ctr/dataset.rs` 的逐点簿记与扫描图像状态
//! - 使用 `regex` 解析内嵌数值列表

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::ctr::dataset::CtrDataset;
use crate::error::{CtrError, Result};
use crate::models::image::Roi;
use crate::models::params::{CorrectionParams, RefAngles, SampleShape, Slits};
use crate::models::params::{GeometryKind, ScanKind};

/// 全部合法键
const KNOWN_KEYS: &[&str] = &[
    "I",
    "Inorm",
    "Ierr",
    "Ibgr",
    "image roi",
    "image rotangle",
    "bgr flag",
    "bgr col nbgr",
    "bgr col width",
    "bgr col power",
    "bgr col tan",
    "bgr row nbgr",
    "bgr row width",
    "bgr row power",
    "bgr row tan",
    "bgr nline",
    "bgr filter",
    "bgr compress",
    "geom",
    "scale",
    "polarization fh",
    "beam_slits",
    "det_slits",
    "sample dia",
    "sample polygon",
    "sample angles",
];

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?").unwrap())
}

/// 从字符串里抽取全部数值
fn parse_numbers(value: &str) -> Vec<f64> {
    number_re()
        .find_iter(value)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

fn is_none_value(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v.is_empty() || v == "none"
}

fn parse_f64(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| CtrError::InvalidParameterValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| CtrError::InvalidParameterValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(CtrError::InvalidParameterValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_slits(key: &str, value: &str) -> Result<Slits> {
    let nums = parse_numbers(value);
    if nums.len() != 2 {
        return Err(CtrError::InvalidParameterValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Slits {
        horz: nums[0],
        vert: nums[1],
    })
}

fn parse_roi(key: &str, value: &str) -> Result<Roi> {
    let nums = parse_numbers(value);
    if nums.len() != 4 {
        return Err(CtrError::InvalidParameterValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(Roi::from_list([
        nums[0] as i64,
        nums[1] as i64,
        nums[2] as i64,
        nums[3] as i64,
    ]))
}

fn parse_vertices(key: &str, value: &str) -> Result<Vec<[f64; 2]>> {
    let nums = parse_numbers(value);
    if nums.len() < 6 || nums.len() % 2 != 0 {
        return Err(CtrError::InvalidParameterValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(nums.chunks(2).map(|c| [c[0], c[1]]).collect())
}

fn fmt_slits(slits: &Option<Slits>) -> String {
    match slits {
        Some(s) => format!("[{}, {}]", s.horz, s.vert),
        None => "none".to_string(),
    }
}

/// 读取一个点的全部可调参数
pub fn get_parameters(ds: &CtrDataset, index: usize) -> Result<BTreeMap<String, String>> {
    let labels = ds.point_labels(index)?.clone();
    let kind = ds.point_kind(index)?;
    let (scan, offset) = ds.get_scan(index)?;

    let mut map = BTreeMap::new();
    map.insert("I".to_string(), labels.i);
    map.insert("Inorm".to_string(), labels.inorm);
    map.insert("Ierr".to_string(), labels.ierr);
    map.insert("Ibgr".to_string(), labels.ibgr);

    if kind == ScanKind::Image {
        if let Some(image) = scan.image() {
            map.insert(
                "image roi".to_string(),
                image
                    .roi(offset)
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            );
            map.insert("image rotangle".to_string(), image.rotangle(offset).to_string());
            let bgr = image.bgr(offset);
            map.insert("bgr flag".to_string(), bgr.flag.to_string());
            map.insert("bgr col nbgr".to_string(), bgr.col_nbgr.to_string());
            map.insert("bgr col width".to_string(), bgr.col_width.to_string());
            map.insert("bgr col power".to_string(), bgr.col_power.to_string());
            map.insert("bgr col tan".to_string(), bgr.col_tangent.to_string());
            map.insert("bgr row nbgr".to_string(), bgr.row_nbgr.to_string());
            map.insert("bgr row width".to_string(), bgr.row_width.to_string());
            map.insert("bgr row power".to_string(), bgr.row_power.to_string());
            map.insert("bgr row tan".to_string(), bgr.row_tangent.to_string());
            map.insert("bgr nline".to_string(), bgr.nline.to_string());
            map.insert("bgr filter".to_string(), bgr.filter.to_string());
            map.insert("bgr compress".to_string(), bgr.compress.to_string());
        }
    }

    match ds.point_corr_params(index)? {
        None => {
            map.insert("geom".to_string(), "none".to_string());
            for key in [
                "scale",
                "polarization fh",
                "beam_slits",
                "det_slits",
                "sample dia",
                "sample polygon",
                "sample angles",
            ] {
                map.insert(key.to_string(), "none".to_string());
            }
        }
        Some(params) => {
            map.insert("geom".to_string(), params.geom.to_string());
            map.insert("scale".to_string(), params.scale.to_string());
            map.insert("polarization fh".to_string(), params.fh.to_string());
            map.insert("beam_slits".to_string(), fmt_slits(&params.beam_slits));
            map.insert("det_slits".to_string(), fmt_slits(&params.det_slits));
            match &params.sample {
                SampleShape::None => {
                    map.insert("sample dia".to_string(), "none".to_string());
                    map.insert("sample polygon".to_string(), "none".to_string());
                    map.insert("sample angles".to_string(), "none".to_string());
                }
                SampleShape::Disk { diameter } => {
                    map.insert("sample dia".to_string(), diameter.to_string());
                    map.insert("sample polygon".to_string(), "none".to_string());
                    map.insert("sample angles".to_string(), "none".to_string());
                }
                SampleShape::Polygon {
                    vertices,
                    reference_angles,
                } => {
                    let verts: Vec<String> =
                        vertices.iter().map(|v| format!("[{}, {}]", v[0], v[1])).collect();
                    map.insert("sample dia".to_string(), "none".to_string());
                    map.insert("sample polygon".to_string(), format!("[{}]", verts.join(", ")));
                    map.insert(
                        "sample angles".to_string(),
                        format!(
                            "[{}, {}, {}, {}]",
                            reference_angles.phi,
                            reference_angles.chi,
                            reference_angles.eta,
                            reference_angles.mu
                        ),
                    );
                }
            }
        }
    }

    Ok(map)
}

/// 写回一个点的可调参数
///
/// 未出现的键保持原值；出现但取值非法的键硬失败，不做半套更新
/// （校正参数整体校验通过后才落盘）。
pub fn set_parameters(
    ds: &mut CtrDataset,
    index: usize,
    params: &BTreeMap<String, String>,
) -> Result<()> {
    for key in params.keys() {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            return Err(CtrError::InvalidArgument(format!(
                "unknown parameter key '{}'",
                key
            )));
        }
    }
    // 先整体解析校正参数，全部合法再写
    let corr = updated_correction(ds, index, params)?;

    let kind = ds.point_kind(index)?;
    let r = ds.point_ref(index);

    {
        let labels = ds.labels_mut(index);
        if let Some(v) = params.get("I") {
            labels.i = v.clone();
        }
        if let Some(v) = params.get("Inorm") {
            labels.inorm = v.clone();
        }
        if let Some(v) = params.get("Ierr") {
            labels.ierr = v.clone();
        }
        if let Some(v) = params.get("Ibgr") {
            labels.ibgr = v.clone();
        }
    }

    if kind == ScanKind::Image {
        if let Some(image) = ds.scan_mut(r.scan).image_mut() {
            if let Some(v) = params.get("image roi") {
                let roi = if is_none_value(v) {
                    None
                } else {
                    Some(parse_roi("image roi", v)?)
                };
                image.set_roi(r.point, roi);
            }
            if let Some(v) = params.get("image rotangle") {
                image.set_rotangle(r.point, parse_f64("image rotangle", v)?);
            }
            let mut bgr = image.bgr(r.point).clone();
            let mut touched = false;
            if let Some(v) = params.get("bgr flag") {
                bgr.flag = parse_usize("bgr flag", v)? as u8;
                touched = true;
            }
            if let Some(v) = params.get("bgr col nbgr") {
                bgr.col_nbgr = parse_usize("bgr col nbgr", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr col width") {
                bgr.col_width = parse_f64("bgr col width", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr col power") {
                bgr.col_power = parse_f64("bgr col power", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr col tan") {
                bgr.col_tangent = parse_bool("bgr col tan", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr row nbgr") {
                bgr.row_nbgr = parse_usize("bgr row nbgr", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr row width") {
                bgr.row_width = parse_f64("bgr row width", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr row power") {
                bgr.row_power = parse_f64("bgr row power", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr row tan") {
                bgr.row_tangent = parse_bool("bgr row tan", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr nline") {
                bgr.nline = parse_usize("bgr nline", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr filter") {
                bgr.filter = parse_bool("bgr filter", v)?;
                touched = true;
            }
            if let Some(v) = params.get("bgr compress") {
                bgr.compress = parse_usize("bgr compress", v)?;
                touched = true;
            }
            if touched {
                image.set_bgr(r.point, bgr);
            }
        }
    }

    *ds.corr_params_mut(index) = corr;
    Ok(())
}

/// 由现值加覆盖项算出新的校正参数（含整体校验）
fn updated_correction(
    ds: &CtrDataset,
    index: usize,
    params: &BTreeMap<String, String>,
) -> Result<Option<CorrectionParams>> {
    let current = ds.point_corr_params(index)?.cloned();

    // geom = none 显式关闭校正
    if let Some(v) = params.get("geom") {
        if is_none_value(v) {
            return Ok(None);
        }
        if v.trim().to_lowercase() != "psic" {
            return Err(CtrError::InvalidParameterValue {
                key: "geom".to_string(),
                value: v.clone(),
            });
        }
    }

    let correction_keys = [
        "geom",
        "scale",
        "polarization fh",
        "beam_slits",
        "det_slits",
        "sample dia",
        "sample polygon",
        "sample angles",
    ];
    let any_given = correction_keys
        .iter()
        .any(|k| params.get(*k).map(|v| !is_none_value(v)).unwrap_or(false));
    if current.is_none() && !any_given {
        return Ok(None);
    }

    let mut corr = current.unwrap_or_default();
    corr.geom = GeometryKind::Psic;

    if let Some(v) = params.get("scale") {
        if !is_none_value(v) {
            corr.scale = parse_f64("scale", v)?;
        }
    }
    if let Some(v) = params.get("polarization fh") {
        if !is_none_value(v) {
            corr.fh = parse_f64("polarization fh", v)?;
        }
    }
    if let Some(v) = params.get("beam_slits") {
        corr.beam_slits = if is_none_value(v) {
            None
        } else {
            Some(parse_slits("beam_slits", v)?)
        };
    }
    if let Some(v) = params.get("det_slits") {
        corr.det_slits = if is_none_value(v) {
            None
        } else {
            Some(parse_slits("det_slits", v)?)
        };
    }

    // 样品外形：dia 优先于多边形，两者都 none 则清掉
    let dia = params.get("sample dia");
    let polygon = params.get("sample polygon");
    let angles = params.get("sample angles");
    if dia.is_some() || polygon.is_some() || angles.is_some() {
        let dia_value = match dia {
            Some(v) if !is_none_value(v) => Some(parse_f64("sample dia", v)?),
            _ => None,
        };
        let polygon_value = match polygon {
            Some(v) if !is_none_value(v) => Some(parse_vertices("sample polygon", v)?),
            _ => None,
        };
        let angles_value = match angles {
            Some(v) if !is_none_value(v) => {
                let nums = parse_numbers(v);
                if nums.is_empty() || nums.len() > 4 {
                    return Err(CtrError::InvalidParameterValue {
                        key: "sample angles".to_string(),
                        value: v.clone(),
                    });
                }
                let mut a = RefAngles::default();
                a.phi = nums[0];
                if nums.len() > 1 {
                    a.chi = nums[1];
                }
                if nums.len() > 2 {
                    a.eta = nums[2];
                }
                if nums.len() > 3 {
                    a.mu = nums[3];
                }
                Some(a)
            }
            _ => None,
        };

        corr.sample = if let Some(diameter) = dia_value {
            SampleShape::Disk { diameter }
        } else if let Some(vertices) = polygon_value {
            SampleShape::Polygon {
                vertices,
                reference_angles: angles_value.unwrap_or_default(),
            }
        } else if angles_value.is_some() {
            // 只给参考角：套用到已有多边形上
            match corr.sample {
                SampleShape::Polygon { vertices, .. } => SampleShape::Polygon {
                    vertices,
                    reference_angles: angles_value.unwrap_or_default(),
                },
                other => other,
            }
        } else {
            SampleShape::None
        };
    }

    corr.validate()?;
    Ok(Some(corr))
}
